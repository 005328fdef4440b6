use std::fs;
use std::path::{Path, PathBuf};

use assert_matches::assert_matches;

use beast_tipdate_prep::annotate::{AnnotateOptions, run_annotate};
use beast_tipdate_prep::config::PrepConfig;
use beast_tipdate_prep::domain::AnnotatedHeader;
use beast_tipdate_prep::error::PrepError;
use beast_tipdate_prep::fasta::read_fasta;

fn options(output: &Path) -> AnnotateOptions {
    AnnotateOptions {
        input_alignment: PathBuf::from("tests/fixtures/alignment.fasta"),
        metadata_file: PathBuf::from("tests/fixtures/metadata.tsv"),
        output_file: output.to_path_buf(),
        furin_annotations_file: PathBuf::from("tests/fixtures/furin_annotations.json"),
        furin_seqs: PathBuf::from("tests/fixtures/furin_seqs.json"),
        exclude_list: None,
    }
}

#[test]
fn annotated_alignment_round_trips_as_fasta() {
    let temp = tempfile::tempdir().unwrap();
    let output = temp.path().join("annotated.fasta");

    let summary = run_annotate(&options(&output), &PrepConfig::default()).unwrap();
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.records_excluded, 0);

    let input = read_fasta(Path::new("tests/fixtures/alignment.fasta")).unwrap();
    let records = read_fasta(&output).unwrap();
    assert_eq!(records.len(), 3);
    for (annotated, original) in records.iter().zip(&input) {
        assert_eq!(annotated.description.split('|').count(), 13);
        assert_eq!(annotated.sequence, original.sequence);
        let header: AnnotatedHeader = annotated.description.parse().unwrap();
        assert_eq!(header.strain, original.description);
    }

    let egypt: AnnotatedHeader = records[0].description.parse().unwrap();
    assert_eq!(egypt.decimal_date, "2015.0");
    assert_eq!(egypt.raw_date, "2015-XX-XX");
    assert_eq!(egypt.host_group, "avian");
    assert_eq!(egypt.host_species, "Gallus_gallus");
    assert_eq!(egypt.furin_motif, "polybasic");
    assert_eq!(egypt.furin_sequence, "PQGEKRRKKR");

    let duck: AnnotatedHeader = records[1].description.parse().unwrap();
    assert_eq!(duck.country, "Viet_Nam");
    assert_eq!(duck.insdc_accession, "");
    let duck_date: f64 = duck.decimal_date.parse().unwrap();
    assert!((duck_date - (2014.0 + 59.0 / 365.0)).abs() < 1e-9);

    let gull: AnnotatedHeader = records[2].description.parse().unwrap();
    let gull_date: f64 = gull.decimal_date.parse().unwrap();
    assert!((gull_date - (2016.0 + 309.0 / 366.0)).abs() < 1e-9);
    assert_eq!(gull.domestic_wild, "wild");
}

#[test]
fn unknown_strain_fails_without_output() {
    let temp = tempfile::tempdir().unwrap();
    let alignment = temp.path().join("alignment.fasta");
    fs::write(
        &alignment,
        ">A/chicken/Egypt/1234/2015\nACGT\n>A/unknown/1/2020\nACGT\n",
    )
    .unwrap();
    let output = temp.path().join("annotated.fasta");
    let mut options = options(&output);
    options.input_alignment = alignment;

    let err = run_annotate(&options, &PrepConfig::default()).unwrap_err();
    assert_matches!(err, PrepError::MissingStrain { ref strain, table: "metadata" } if strain == "A/unknown/1/2020");
    assert!(!output.exists());
}

#[test]
fn failed_run_clears_previous_output() {
    let temp = tempfile::tempdir().unwrap();
    let alignment = temp.path().join("alignment.fasta");
    fs::write(&alignment, ">A/unknown/1/2020\nACGT\n").unwrap();
    let output = temp.path().join("annotated.fasta");
    fs::write(&output, ">STALE|from|previous|run\nAAAA\n").unwrap();
    let mut options = options(&output);
    options.input_alignment = alignment;

    let err = run_annotate(&options, &PrepConfig::default()).unwrap_err();
    assert_matches!(err, PrepError::MissingStrain { .. });
    assert!(!output.exists());
}

#[test]
fn missing_metadata_clears_previous_output() {
    let temp = tempfile::tempdir().unwrap();
    let output = temp.path().join("annotated.fasta");
    fs::write(&output, ">STALE|from|previous|run\nAAAA\n").unwrap();
    let mut options = options(&output);
    options.metadata_file = temp.path().join("missing.tsv");

    assert!(run_annotate(&options, &PrepConfig::default()).is_err());
    assert!(!output.exists());
}

#[test]
fn exclusion_list_drops_strains() {
    let temp = tempfile::tempdir().unwrap();
    let exclude = temp.path().join("exclude.txt");
    fs::write(&exclude, "A/gull/Netherlands/7/2016|2016.8|2016-11-05\n").unwrap();
    let output = temp.path().join("annotated.fasta");
    let mut options = options(&output);
    options.exclude_list = Some(exclude);

    let summary = run_annotate(&options, &PrepConfig::default()).unwrap();
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.records_excluded, 1);
    let records = read_fasta(&output).unwrap();
    assert!(records.iter().all(|r| !r.description.starts_with("A/gull")));
}

#[test]
fn renamed_column_needs_config() {
    let temp = tempfile::tempdir().unwrap();
    let metadata = temp.path().join("metadata.tsv");
    let original = fs::read_to_string("tests/fixtures/metadata.tsv").unwrap();
    fs::write(&metadata, original.replacen("h5_label_clade", "clade", 1)).unwrap();
    let output = temp.path().join("annotated.fasta");
    let mut options = options(&output);
    options.metadata_file = metadata;

    let err = run_annotate(&options, &PrepConfig::default()).unwrap_err();
    assert_matches!(err, PrepError::MissingColumn { ref column, .. } if column == "h5_label_clade");

    let mut config = PrepConfig::default();
    config.metadata.clade = "clade".to_string();
    let summary = run_annotate(&options, &config).unwrap();
    assert_eq!(summary.records_written, 3);
}
