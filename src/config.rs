use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::domain::AnnotatedHeader;
use crate::error::PrepError;

/// Settings shared by both tools. Every field has a default, so a config
/// file only needs to name what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrepConfig {
    pub metadata: MetadataColumns,
    pub annotations: AnnotationFields,
    pub template: TemplateConfig,
}

/// Column names looked up in the metadata header row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataColumns {
    pub strain: String,
    pub host_group: String,
    pub host_species: String,
    pub domestic_wild: String,
    pub accession: String,
    pub insdc_accession: String,
    pub clade: String,
    pub annotation_method: String,
    pub region: String,
    pub country: String,
    pub division: String,
    pub date: String,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            strain: "strain".to_string(),
            host_group: "host".to_string(),
            host_species: "host_species_standardized".to_string(),
            domestic_wild: "domestic_wild".to_string(),
            accession: "isolate_id".to_string(),
            insdc_accession: "INSDC_accession".to_string(),
            clade: "h5_label_clade".to_string(),
            annotation_method: "annotation_method".to_string(),
            region: "region".to_string(),
            country: "country".to_string(),
            division: "division".to_string(),
            date: "date".to_string(),
        }
    }
}

/// Per-strain field names inside the `nodes` map of each annotation JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnnotationFields {
    pub furin_motif: String,
    pub furin_sequence: String,
}

impl Default for AnnotationFields {
    fn default() -> Self {
        Self {
            furin_motif: "furin_cleavage_motif".to_string(),
            furin_sequence: "cleavage_site_sequence".to_string(),
        }
    }
}

/// Literal prefixes and markers recognised in the BEAST template, plus the
/// tip-date calibration constants.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub alignment_prefix: String,
    pub type_trait_prefix: String,
    pub date_trait_prefix: String,
    pub prior_marker: String,
    pub operator_marker: String,
    pub logger_marker: String,
    pub skip_prefixes: Vec<String>,
    pub trait_field: usize,
    pub calibration_seed: u32,
    pub upper_bound_offset: f64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            alignment_prefix: "id=\"".to_string(),
            type_trait_prefix: "                        <typeTrait id=\"typeTraitSet.t:"
                .to_string(),
            date_trait_prefix: "                <trait id=\"dateTrait.t:".to_string(),
            prior_marker: "<!--  add tip calibration here -->".to_string(),
            operator_marker: "<!-- insert tip calibration operators -->".to_string(),
            logger_marker: "<!-- insert tip calibration loggers -->".to_string(),
            skip_prefixes: vec![
                "name=\"alignment".to_string(),
                "spec=\"Alignment".to_string(),
                "        <sequence id".to_string(),
            ],
            trait_field: AnnotatedHeader::DOMESTIC_WILD_INDEX,
            calibration_seed: 10,
            upper_bound_offset: 0.9959,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` when given, otherwise returns the built-in defaults.
    pub fn resolve(path: Option<&Utf8Path>) -> Result<PrepConfig, PrepError> {
        let Some(path) = path else {
            return Ok(PrepConfig::default());
        };
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| PrepError::ConfigRead(path.as_std_path().to_path_buf()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<PrepConfig, PrepError> {
        serde_json::from_str(content).map_err(|err| PrepError::ConfigParse(err.to_string()))
    }
}
