use std::fs;
use std::path::{Path, PathBuf};

use assert_matches::assert_matches;

use beast_tipdate_prep::annotate::{AnnotateOptions, run_annotate};
use beast_tipdate_prep::config::PrepConfig;
use beast_tipdate_prep::error::PrepError;
use beast_tipdate_prep::template::{BuildOptions, run_build};

fn annotated_alignment(dir: &Path) -> PathBuf {
    let output = dir.join("annotated.fasta");
    let options = AnnotateOptions {
        input_alignment: PathBuf::from("tests/fixtures/alignment.fasta"),
        metadata_file: PathBuf::from("tests/fixtures/metadata.tsv"),
        output_file: output.clone(),
        furin_annotations_file: PathBuf::from("tests/fixtures/furin_annotations.json"),
        furin_seqs: PathBuf::from("tests/fixtures/furin_seqs.json"),
        exclude_list: None,
    };
    run_annotate(&options, &PrepConfig::default()).unwrap();
    output
}

fn build_options(input: PathBuf, output: PathBuf) -> BuildOptions {
    BuildOptions {
        input_alignment: input,
        alignment_name: "h5_gsgd".to_string(),
        output_file: output,
        template_xml: PathBuf::from("tests/fixtures/template.xml"),
        template_alignment_name: "h5_template".to_string(),
    }
}

#[test]
fn template_is_filled_from_annotated_alignment() {
    let temp = tempfile::tempdir().unwrap();
    let input = annotated_alignment(temp.path());
    let output = temp.path().join("beast.xml");

    let summary = run_build(&build_options(input, output.clone()), &PrepConfig::default()).unwrap();
    assert_eq!(summary.sequences, 3);
    assert_eq!(summary.tip_calibrations, 1);
    assert_eq!(summary.alignment_name, "h5_gsgd");

    let xml = fs::read_to_string(&output).unwrap();
    assert!(!xml.contains("h5_template"));
    assert!(!xml.contains("seq_placeholder"));
    assert_eq!(xml.matches("<sequence id=\"seq_").count(), 3);
    assert!(xml.contains("id=\"h5_gsgd\"\nspec=\"Alignment\"\nname=\"alignment\">\n"));
    assert!(xml.contains("<tree id=\"Tree.t:h5_gsgd\""));

    let type_line = xml
        .lines()
        .find(|line| line.contains("typeTraitSet.t:"))
        .unwrap();
    let pairs = type_line.split("value=\"").nth(1).unwrap();
    assert_eq!(pairs.trim_end_matches("\">").split(',').count(), 3);
    assert!(type_line.contains("|Larus_argentatus|wild=wild"));
    assert!(type_line.contains("|Gallus_gallus|domestic=domestic"));

    let date_line = xml
        .lines()
        .find(|line| line.contains("dateTrait.t:h5_gsgd"))
        .unwrap();
    assert!(date_line.contains("|2.2.1.2|Gallus_gallus|domestic=2015.5"));

    assert!(xml.contains("<distribution id=\"A/chicken/Egypt/1234/2015.prior\""));
    assert!(xml.contains(
        "<Uniform id=\"Uniform.11\" lower=\"2015\" name=\"distr\" upper=\"2015.9959\"/>"
    ));
    assert!(xml.contains("tipDatesSamplerA/chicken/Egypt/1234/2015"));
    assert!(xml.contains("<log idref=\"A/chicken/Egypt/1234/2015.prior\"/>"));
    assert!(!xml.contains("tipDatesSamplerA/gull"));
}

#[test]
fn plain_headers_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let output = temp.path().join("beast.xml");
    let options = build_options(PathBuf::from("tests/fixtures/alignment.fasta"), output.clone());

    let err = run_build(&options, &PrepConfig::default()).unwrap_err();
    assert_matches!(err, PrepError::InvalidHeader { expected: 13, found: 1, .. });
    assert!(!output.exists());
}
