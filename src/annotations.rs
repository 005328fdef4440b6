use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::config::AnnotationFields;
use crate::domain::{FurinAnnotation, FurinSequence};
use crate::error::PrepError;

#[derive(Debug, Deserialize)]
struct NodeDocument {
    nodes: HashMap<String, Map<String, Value>>,
}

/// One `{"nodes": {strain: {field: value}}}` document with the field to
/// read from each node.
#[derive(Debug, Clone)]
pub struct NodeTable {
    name: &'static str,
    path: PathBuf,
    field: String,
    nodes: HashMap<String, Map<String, Value>>,
}

impl NodeTable {
    pub fn load(path: &Path, name: &'static str, field: &str) -> Result<Self, PrepError> {
        let content = fs::read_to_string(path)
            .map_err(|err| PrepError::Filesystem(format!("read {}: {err}", path.display())))?;
        let table = Self::parse(&content, path, name, field)?;
        info!(path = %path.display(), strains = table.len(), table = name, "loaded annotations");
        Ok(table)
    }

    pub fn parse(
        content: &str,
        path: &Path,
        name: &'static str,
        field: &str,
    ) -> Result<Self, PrepError> {
        let document: NodeDocument =
            serde_json::from_str(content).map_err(|err| PrepError::AnnotationParse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        Ok(Self {
            name,
            path: path.to_path_buf(),
            field: field.to_string(),
            nodes: document.nodes,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// String value of the configured field for `strain`.
    pub fn value(&self, strain: &str) -> Result<&str, PrepError> {
        let node = self.nodes.get(strain).ok_or_else(|| PrepError::MissingStrain {
            strain: strain.to_string(),
            table: self.name,
        })?;
        let missing = || PrepError::MissingAnnotationField {
            path: self.path.clone(),
            strain: strain.to_string(),
            field: self.field.clone(),
        };
        match node.get(&self.field) {
            Some(Value::String(value)) => Ok(value.as_str()),
            Some(other) => Err(PrepError::AnnotationParse {
                path: self.path.clone(),
                message: format!("{strain}.{} is not a string: {other}", self.field),
            }),
            None => Err(missing()),
        }
    }
}

/// Furin cleavage motif classifications and raw cleavage-site sequences.
#[derive(Debug, Clone)]
pub struct FurinTables {
    motifs: NodeTable,
    sequences: NodeTable,
}

impl FurinTables {
    pub const MOTIFS: &'static str = "furin annotations";
    pub const SEQUENCES: &'static str = "furin sequences";

    pub fn load(
        motifs_path: &Path,
        sequences_path: &Path,
        fields: &AnnotationFields,
    ) -> Result<Self, PrepError> {
        Ok(Self {
            motifs: NodeTable::load(motifs_path, Self::MOTIFS, &fields.furin_motif)?,
            sequences: NodeTable::load(sequences_path, Self::SEQUENCES, &fields.furin_sequence)?,
        })
    }

    pub fn new(motifs: NodeTable, sequences: NodeTable) -> Self {
        Self { motifs, sequences }
    }

    pub fn motif(&self, strain: &str) -> Result<FurinAnnotation, PrepError> {
        Ok(FurinAnnotation {
            motif: self.motifs.value(strain)?.to_string(),
        })
    }

    pub fn sequence(&self, strain: &str) -> Result<FurinSequence, PrepError> {
        Ok(FurinSequence {
            sequence: self.sequences.value(strain)?.to_string(),
        })
    }
}
