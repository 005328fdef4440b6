use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use bio::io::fasta;
use tracing::{debug, warn};

use crate::error::PrepError;

/// A FASTA record: the header line without `>` and the joined sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub description: String,
    pub sequence: String,
}

impl FastaRecord {
    pub fn new(description: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            sequence: sequence.into(),
        }
    }

    /// Header text up to the first whitespace.
    pub fn id(&self) -> &str {
        self.description
            .split_whitespace()
            .next()
            .unwrap_or_default()
    }

    /// Writes `>description` and the whole sequence on one line each.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b">")?;
        writer.write_all(self.description.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.write_all(self.sequence.as_bytes())?;
        writer.write_all(b"\n")
    }

    fn from_bio(record: &fasta::Record, path: &Path) -> Result<Self, PrepError> {
        let description = match record.desc() {
            Some(desc) if !desc.is_empty() => format!("{} {desc}", record.id()),
            _ => record.id().to_string(),
        };
        let sequence =
            String::from_utf8(record.seq().to_vec()).map_err(|_| PrepError::InvalidFasta {
                path: path.to_path_buf(),
                message: format!("sequence for {} is not valid UTF-8", record.id()),
            })?;
        Ok(Self::new(description, sequence))
    }
}

pub fn read_fasta(path: &Path) -> Result<Vec<FastaRecord>, PrepError> {
    let file = File::open(path)
        .map_err(|err| PrepError::Filesystem(format!("open {}: {err}", path.display())))?;
    parse_fasta(file, path)
}

/// Parses FASTA text. Multi-line sequences are joined; blank lines inside a
/// record are ignored.
pub fn parse_fasta<R: Read>(reader: R, path: &Path) -> Result<Vec<FastaRecord>, PrepError> {
    let records = fasta::Reader::new(reader)
        .records()
        .map(|record| {
            let record = record.map_err(|err| PrepError::InvalidFasta {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
            FastaRecord::from_bio(&record, path)
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(path = %path.display(), records = records.len(), "parsed FASTA");
    Ok(records)
}

/// Sequences keyed by record id, in first-seen order.
///
/// A repeated id replaces the earlier sequence but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Alignment {
    pub fn from_records(records: Vec<FastaRecord>) -> Self {
        let mut alignment = Self::default();
        for record in records {
            let id = record.id().to_string();
            alignment.insert(id, record.sequence);
        }
        alignment
    }

    pub fn insert(&mut self, id: String, sequence: String) {
        match self.index.get(&id) {
            Some(&position) => {
                warn!(id = %id, "duplicate alignment id, keeping the later sequence");
                self.entries[position].1 = sequence;
            }
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, sequence));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(id, sequence)| (id.as_str(), sequence.as_str()))
    }
}
