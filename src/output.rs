use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::PrepError;

/// Buffered output written next to its destination and moved into place
/// only by [`AtomicOutput::commit`]. An existing destination is removed at
/// creation, so a run that fails before committing leaves no output at all.
pub struct AtomicOutput {
    writer: BufWriter<NamedTempFile>,
    dest: PathBuf,
}

impl AtomicOutput {
    pub fn create(dest: &Path) -> Result<Self, PrepError> {
        let parent = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|err| PrepError::Filesystem(err.to_string()))?;
        if dest.exists() {
            fs::remove_file(dest).map_err(|err| {
                PrepError::Filesystem(format!("remove {}: {err}", dest.display()))
            })?;
        }
        let temp = tempfile::Builder::new()
            .prefix(".beast-prep")
            .tempfile_in(parent)
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        Ok(Self {
            writer: BufWriter::new(temp),
            dest: dest.to_path_buf(),
        })
    }

    pub fn writer(&mut self) -> &mut impl Write {
        &mut self.writer
    }

    pub fn commit(self) -> Result<PathBuf, PrepError> {
        let temp = self
            .writer
            .into_inner()
            .map_err(|err| PrepError::Filesystem(err.error().to_string()))?;
        temp.persist(&self.dest)
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        info!(path = %self.dest.display(), "wrote output");
        Ok(self.dest)
    }
}

pub fn write_err(dest: &Path, err: io::Error) -> PrepError {
    PrepError::Filesystem(format!("write {}: {err}", dest.display()))
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotateSummary {
    pub output: String,
    pub records_written: usize,
    pub records_excluded: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub output: String,
    pub alignment_name: String,
    pub sequences: usize,
    pub tip_calibrations: usize,
    pub most_recent_tip: Option<f64>,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_annotate(summary: &AnnotateSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_build(summary: &BuildSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
