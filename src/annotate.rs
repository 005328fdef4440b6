use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::annotations::FurinTables;
use crate::config::PrepConfig;
use crate::domain::{AnnotatedHeader, HEADER_DELIMITER};
use crate::error::PrepError;
use crate::fasta::{self, FastaRecord};
use crate::metadata::MetadataTable;
use crate::output::{self, AnnotateSummary, AtomicOutput};

#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    pub input_alignment: PathBuf,
    pub metadata_file: PathBuf,
    pub output_file: PathBuf,
    pub furin_annotations_file: PathBuf,
    pub furin_seqs: PathBuf,
    pub exclude_list: Option<PathBuf>,
}

/// Lookup tables joined onto each alignment record.
pub struct AnnotationSources<'a> {
    pub metadata: &'a MetadataTable,
    pub furin: &'a FurinTables,
    pub excluded: &'a HashSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateStats {
    pub written: usize,
    pub excluded: usize,
}

/// Rewrites one record's header; the sequence is carried over unchanged.
pub fn annotate_record(
    record: &FastaRecord,
    metadata: &MetadataTable,
    furin: &FurinTables,
) -> Result<FastaRecord, PrepError> {
    let strain = record.description.as_str();
    let row = metadata.get(strain)?;
    let motif = furin.motif(strain)?;
    let site = furin.sequence(strain)?;
    let header = AnnotatedHeader::build(strain, row, &motif, &site)?;
    Ok(FastaRecord::new(header.to_string(), record.sequence.clone()))
}

/// Annotates `records` in order into `writer`, stopping at the first record
/// that cannot be joined.
pub fn annotate_alignment<W: Write>(
    records: &[FastaRecord],
    sources: &AnnotationSources<'_>,
    writer: &mut W,
    dest: &Path,
) -> Result<AnnotateStats, PrepError> {
    let mut stats = AnnotateStats::default();
    for record in records {
        if sources.excluded.contains(&record.description) {
            warn!(strain = %record.description, "strain on exclusion list, skipping");
            stats.excluded += 1;
            continue;
        }
        let annotated = annotate_record(record, sources.metadata, sources.furin)?;
        debug!(header = %annotated.description, "annotated record");
        annotated
            .write_to(writer)
            .map_err(|err| output::write_err(dest, err))?;
        stats.written += 1;
    }
    Ok(stats)
}

/// Strain names to drop, taken from the first pipe-delimited field of each
/// non-blank line.
pub fn read_exclusion_list(path: &Path) -> Result<HashSet<String>, PrepError> {
    let content = fs::read_to_string(path)
        .map_err(|err| PrepError::Filesystem(format!("read {}: {err}", path.display())))?;
    Ok(parse_exclusion_list(&content))
}

pub fn parse_exclusion_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| line.split(HEADER_DELIMITER).next())
        .map(|strain| strain.trim().to_string())
        .collect()
}

pub fn run_annotate(
    options: &AnnotateOptions,
    config: &PrepConfig,
) -> Result<AnnotateSummary, PrepError> {
    let mut output = AtomicOutput::create(&options.output_file)?;
    let metadata = MetadataTable::load(&options.metadata_file, &config.metadata)?;
    let furin = FurinTables::load(
        &options.furin_annotations_file,
        &options.furin_seqs,
        &config.annotations,
    )?;
    let excluded = match &options.exclude_list {
        Some(path) => read_exclusion_list(path)?,
        None => HashSet::new(),
    };
    let records = fasta::read_fasta(&options.input_alignment)?;
    info!(records = records.len(), excluded = excluded.len(), "annotating alignment");

    let sources = AnnotationSources {
        metadata: &metadata,
        furin: &furin,
        excluded: &excluded,
    };
    let stats = annotate_alignment(&records, &sources, output.writer(), &options.output_file)?;
    let path = output.commit()?;

    Ok(AnnotateSummary {
        output: path.display().to_string(),
        records_written: stats.written,
        records_excluded: stats.excluded,
    })
}
