use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use crate::config::MetadataColumns;
use crate::domain::StrainMetadata;
use crate::error::PrepError;

/// Metadata rows keyed by strain name.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    rows: HashMap<String, StrainMetadata>,
}

impl MetadataTable {
    pub const NAME: &'static str = "metadata";

    pub fn load(path: &Path, columns: &MetadataColumns) -> Result<Self, PrepError> {
        let file = std::fs::File::open(path)
            .map_err(|err| PrepError::Filesystem(format!("open {}: {err}", path.display())))?;
        let table = Self::from_reader(file, path, columns)?;
        info!(path = %path.display(), strains = table.len(), "loaded metadata");
        Ok(table)
    }

    /// Reads tab-separated metadata whose first row names the columns.
    /// Columns are resolved by name, so their order in the file is free.
    pub fn from_reader<R: Read>(
        reader: R,
        path: &Path,
        columns: &MetadataColumns,
    ) -> Result<Self, PrepError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|err| row_error(path, &err))?
            .clone();
        let layout = ColumnLayout::resolve(&headers, columns, path)?;

        let mut rows = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|err| row_error(path, &err))?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            let (strain, metadata) = layout.extract(&record, path, line)?;
            rows.insert(strain, metadata);
        }
        Ok(Self { rows })
    }

    pub fn get(&self, strain: &str) -> Result<&StrainMetadata, PrepError> {
        self.rows.get(strain).ok_or_else(|| PrepError::MissingStrain {
            strain: strain.to_string(),
            table: Self::NAME,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn row_error(path: &Path, err: &csv::Error) -> PrepError {
    PrepError::MetadataRow {
        path: path.to_path_buf(),
        line: err.position().map(|pos| pos.line()).unwrap_or_default(),
        message: err.to_string(),
    }
}

struct ColumnLayout {
    strain: usize,
    host_group: usize,
    host_species: usize,
    domestic_wild: usize,
    accession: usize,
    insdc_accession: usize,
    clade: usize,
    annotation_method: usize,
    region: usize,
    country: usize,
    division: usize,
    date: usize,
}

const LINE_END: [char; 2] = ['\r', '\n'];

impl ColumnLayout {
    fn resolve(
        headers: &StringRecord,
        columns: &MetadataColumns,
        path: &Path,
    ) -> Result<Self, PrepError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim_end_matches(LINE_END) == name)
                .ok_or_else(|| PrepError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
        };
        Ok(Self {
            strain: position(&columns.strain)?,
            host_group: position(&columns.host_group)?,
            host_species: position(&columns.host_species)?,
            domestic_wild: position(&columns.domestic_wild)?,
            accession: position(&columns.accession)?,
            insdc_accession: position(&columns.insdc_accession)?,
            clade: position(&columns.clade)?,
            annotation_method: position(&columns.annotation_method)?,
            region: position(&columns.region)?,
            country: position(&columns.country)?,
            division: position(&columns.division)?,
            date: position(&columns.date)?,
        })
    }

    fn extract(
        &self,
        record: &StringRecord,
        path: &Path,
        line: u64,
    ) -> Result<(String, StrainMetadata), PrepError> {
        let cell = |index: usize| {
            record
                .get(index)
                .map(|value| value.trim_end_matches(LINE_END).to_string())
                .ok_or_else(|| PrepError::MetadataRow {
                    path: path.to_path_buf(),
                    line,
                    message: format!(
                        "expected at least {} columns, found {}",
                        index + 1,
                        record.len()
                    ),
                })
        };

        let metadata = StrainMetadata {
            accession: cell(self.accession)?,
            insdc_accession: cell(self.insdc_accession)?,
            region: cell(self.region)?,
            country: cell(self.country)?,
            division: cell(self.division)?,
            domestic_wild: cell(self.domestic_wild)?,
            host_group: cell(self.host_group)?.to_lowercase(),
            host_species: cell(self.host_species)?,
            date: cell(self.date)?,
            annotation_method: cell(self.annotation_method)?,
            clade: cell(self.clade)?,
        };
        Ok((cell(self.strain)?, metadata))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const HEADER: &str = "strain\tdate\tregion\tcountry\tdivision\thost\thost_species_standardized\tdomestic_wild\tisolate_id\tINSDC_accession\th5_label_clade\tannotation_method";

    fn load(text: &str) -> Result<MetadataTable, PrepError> {
        MetadataTable::from_reader(
            text.as_bytes(),
            Path::new("metadata.tsv"),
            &MetadataColumns::default(),
        )
    }

    #[test]
    fn columns_resolve_by_name() {
        let text = format!(
            "{HEADER}\nA/duck/Egypt/1/2015\t2015-XX-XX\tAfrica\tEgypt\tCairo\tAvian\tAnas platyrhynchos\tdomestic\tEPI1\tKX1\t2.2.1\tnextclade\n"
        );
        let table = load(&text).unwrap();
        let row = table.get("A/duck/Egypt/1/2015").unwrap();
        assert_eq!(row.date, "2015-XX-XX");
        assert_eq!(row.host_group, "avian");
        assert_eq!(row.host_species, "Anas platyrhynchos");
        assert_eq!(row.annotation_method, "nextclade");
    }

    #[test]
    fn cell_whitespace_is_kept() {
        let text = format!(
            "{HEADER}\r\nA/duck/Egypt/1/2015\t2015-XX-XX\tAfrica\tEgypt \tCairo\tAvian\tAnas platyrhynchos\tdomestic\tEPI1\tKX1\t2.2.1\tnextclade\r\n"
        );
        let table = load(&text).unwrap();
        let row = table.get("A/duck/Egypt/1/2015").unwrap();
        assert_eq!(row.country, "Egypt ");
        assert_eq!(row.annotation_method, "nextclade");
    }

    #[test]
    fn missing_column_fails_at_load() {
        let err = load("strain\tdate\nA\t2015\n").unwrap_err();
        assert_matches!(err, PrepError::MissingColumn { .. });
    }

    #[test]
    fn unknown_strain_is_reported() {
        let table = load(&format!("{HEADER}\n")).unwrap();
        assert!(table.is_empty());
        assert_matches!(
            table.get("nope"),
            Err(PrepError::MissingStrain { table: "metadata", .. })
        );
    }

    #[test]
    fn short_row_is_an_error() {
        let err = load(&format!("{HEADER}\nA\t2015\n")).unwrap_err();
        assert_matches!(err, PrepError::MetadataRow { .. });
    }
}
