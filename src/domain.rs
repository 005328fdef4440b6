use std::fmt;
use std::str::FromStr;

use crate::dates::{self, CollectionDate};
use crate::error::PrepError;

pub const HEADER_DELIMITER: char = '|';
pub const HEADER_FIELD_COUNT: usize = 13;

/// One metadata row, keyed externally by strain name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrainMetadata {
    pub accession: String,
    pub insdc_accession: String,
    pub region: String,
    pub country: String,
    pub division: String,
    pub domestic_wild: String,
    pub host_group: String,
    pub host_species: String,
    pub date: String,
    pub annotation_method: String,
    pub clade: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurinAnnotation {
    pub motif: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurinSequence {
    pub sequence: String,
}

/// The pipe-delimited FASTA header shared by both tools.
///
/// Field order is fixed: strain, decimal date, raw date, host group, region,
/// country, INSDC accession, accession, furin motif, furin sequence, clade,
/// host species, domestic/wild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedHeader {
    pub strain: String,
    pub decimal_date: String,
    pub raw_date: String,
    pub host_group: String,
    pub region: String,
    pub country: String,
    pub insdc_accession: String,
    pub accession: String,
    pub furin_motif: String,
    pub furin_sequence: String,
    pub clade: String,
    pub host_species: String,
    pub domestic_wild: String,
}

impl AnnotatedHeader {
    pub const DECIMAL_DATE_INDEX: usize = 1;
    pub const RAW_DATE_INDEX: usize = 2;
    pub const HOST_SPECIES_INDEX: usize = 11;
    pub const DOMESTIC_WILD_INDEX: usize = 12;

    /// Joins one strain's metadata and furin annotations into a header.
    ///
    /// Free-text fields have spaces replaced with underscores; `?` is dropped
    /// from country and both accessions. The decimal date is computed from
    /// the raw date with `-XX` placeholders removed.
    pub fn build(
        strain: &str,
        metadata: &StrainMetadata,
        motif: &FurinAnnotation,
        site: &FurinSequence,
    ) -> Result<Self, PrepError> {
        let cleaned = dates::strip_ambiguous(&metadata.date);
        let decimal = cleaned.parse::<CollectionDate>()?.decimal_year();

        Ok(Self {
            strain: strain.to_string(),
            decimal_date: dates::format_decimal(decimal),
            raw_date: metadata.date.clone(),
            host_group: underscored(&metadata.host_group),
            region: underscored(&metadata.region),
            country: scrubbed(&metadata.country),
            insdc_accession: scrubbed(&metadata.insdc_accession),
            accession: scrubbed(&metadata.accession),
            furin_motif: motif.motif.clone(),
            furin_sequence: site.sequence.clone(),
            clade: metadata.clade.clone(),
            host_species: underscored(&metadata.host_species),
            domestic_wild: underscored(&metadata.domestic_wild),
        })
    }

    pub fn fields(&self) -> [&str; HEADER_FIELD_COUNT] {
        [
            &self.strain,
            &self.decimal_date,
            &self.raw_date,
            &self.host_group,
            &self.region,
            &self.country,
            &self.insdc_accession,
            &self.accession,
            &self.furin_motif,
            &self.furin_sequence,
            &self.clade,
            &self.host_species,
            &self.domestic_wild,
        ]
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields().get(index).copied()
    }

    pub fn has_year_only_date(&self) -> bool {
        dates::is_year_only(&self.raw_date)
    }
}

fn underscored(value: &str) -> String {
    value.replace(' ', "_")
}

fn scrubbed(value: &str) -> String {
    underscored(value).replace('?', "")
}

impl fmt::Display for AnnotatedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields().iter().enumerate() {
            if i > 0 {
                write!(f, "{HEADER_DELIMITER}")?;
            }
            f.write_str(field)?;
        }
        Ok(())
    }
}

impl FromStr for AnnotatedHeader {
    type Err = PrepError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value.split(HEADER_DELIMITER).collect::<Vec<_>>();
        let [
            strain,
            decimal_date,
            raw_date,
            host_group,
            region,
            country,
            insdc_accession,
            accession,
            furin_motif,
            furin_sequence,
            clade,
            host_species,
            domestic_wild,
        ] = parts.as_slice()
        else {
            return Err(PrepError::InvalidHeader {
                header: value.to_string(),
                expected: HEADER_FIELD_COUNT,
                found: parts.len(),
            });
        };

        Ok(Self {
            strain: strain.to_string(),
            decimal_date: decimal_date.to_string(),
            raw_date: raw_date.to_string(),
            host_group: host_group.to_string(),
            region: region.to_string(),
            country: country.to_string(),
            insdc_accession: insdc_accession.to_string(),
            accession: accession.to_string(),
            furin_motif: furin_motif.to_string(),
            furin_sequence: furin_sequence.to_string(),
            clade: clade.to_string(),
            host_species: host_species.to_string(),
            domestic_wild: domestic_wild.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn metadata(date: &str) -> StrainMetadata {
        StrainMetadata {
            accession: "EPI_ISL_1?".to_string(),
            insdc_accession: "KX 123".to_string(),
            region: "Africa".to_string(),
            country: "Egypt ?".to_string(),
            division: "Cairo".to_string(),
            domestic_wild: "domestic bird".to_string(),
            host_group: "avian".to_string(),
            host_species: "Gallus gallus".to_string(),
            date: date.to_string(),
            annotation_method: "nextclade".to_string(),
            clade: "2.2.1".to_string(),
        }
    }

    fn furin() -> (FurinAnnotation, FurinSequence) {
        (
            FurinAnnotation {
                motif: "HPAI".to_string(),
            },
            FurinSequence {
                sequence: "PQGEKRRKKR".to_string(),
            },
        )
    }

    #[test]
    fn build_normalizes_fields() {
        let (motif, site) = furin();
        let header =
            AnnotatedHeader::build("A/chicken/Egypt/1/2015", &metadata("2015-XX-XX"), &motif, &site)
                .unwrap();
        assert_eq!(
            header.to_string(),
            "A/chicken/Egypt/1/2015|2015.0|2015-XX-XX|avian|Africa|Egypt_|KX_123|EPI_ISL_1|HPAI|PQGEKRRKKR|2.2.1|Gallus_gallus|domestic_bird"
        );
    }

    #[test]
    fn build_rejects_bad_date() {
        let (motif, site) = furin();
        let err = AnnotatedHeader::build("x", &metadata("June 2015"), &motif, &site).unwrap_err();
        assert_matches!(err, PrepError::InvalidDate(_));
    }

    #[test]
    fn parse_display_preserves_text() {
        let (motif, site) = furin();
        let header =
            AnnotatedHeader::build("A/duck/Viet Nam/2/2014", &metadata("2014-03-02"), &motif, &site)
                .unwrap();
        let text = header.to_string();
        let parsed: AnnotatedHeader = text.parse().unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.field(AnnotatedHeader::HOST_SPECIES_INDEX), Some("Gallus_gallus"));
    }

    #[test]
    fn parse_rejects_wrong_field_count() {
        let err = "a|b|c".parse::<AnnotatedHeader>().unwrap_err();
        assert_matches!(err, PrepError::InvalidHeader { found: 3, .. });
    }
}
