use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PrepError {
    #[error("metadata file {path} has no column named {column}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("metadata file {path} line {line}: {message}")]
    MetadataRow {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("failed to parse annotation JSON {path}: {message}")]
    AnnotationParse { path: PathBuf, message: String },

    #[error("annotation JSON {path}: strain {strain} has no field {field}")]
    MissingAnnotationField {
        path: PathBuf,
        strain: String,
        field: String,
    },

    #[error("strain {strain} not found in {table}")]
    #[diagnostic(help("every alignment record must be present in the metadata and both furin annotation files"))]
    MissingStrain { strain: String, table: &'static str },

    #[error("invalid date: {0}")]
    #[diagnostic(help("expected YYYY, YYYY-MM or YYYY-MM-DD"))]
    InvalidDate(String),

    #[error("annotated header must have {expected} pipe-delimited fields, found {found}: {header}")]
    InvalidHeader {
        header: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid decimal date {value} in header of {strain}")]
    InvalidDecimalDate { strain: String, value: String },

    #[error("invalid FASTA {path}: {message}")]
    InvalidFasta { path: PathBuf, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl PrepError {
    /// True for errors caused by malformed input content rather than I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PrepError::MissingColumn { .. }
                | PrepError::MetadataRow { .. }
                | PrepError::AnnotationParse { .. }
                | PrepError::MissingAnnotationField { .. }
                | PrepError::InvalidDate(_)
                | PrepError::InvalidHeader { .. }
                | PrepError::InvalidDecimalDate { .. }
                | PrepError::InvalidFasta { .. }
                | PrepError::ConfigRead(_)
                | PrepError::ConfigParse(_)
        )
    }
}
