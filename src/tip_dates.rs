use tracing::debug;

use crate::config::TemplateConfig;
use crate::dates;
use crate::domain::AnnotatedHeader;
use crate::error::PrepError;

/// Prior bounds for a year-only tip, in absolute decimal years: the whole
/// calendar year from January 1st to December 31st.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateBounds {
    pub lower: f64,
    pub upper: f64,
}

impl DateBounds {
    pub fn for_year(year: f64, upper_offset: f64) -> Self {
        Self {
            lower: year,
            upper: year + upper_offset,
        }
    }
}

/// Calibration for one strain whose date is known only to the year.
#[derive(Debug, Clone, PartialEq)]
pub struct TipCalibration {
    pub strain: String,
    pub taxon: String,
    pub bounds: DateBounds,
    pub id: u32,
}

impl TipCalibration {
    /// Six-line `MRCAPrior` fragment for the calibrated tip.
    pub fn prior_block(&self, alignment_name: &str) -> String {
        let Self {
            strain,
            taxon,
            bounds,
            id,
        } = self;
        [
            format!(
                r#"            <distribution id="{strain}.prior" spec="beast.base.evolution.tree.MRCAPrior" tipsonly="true" tree="@Tree.t:{alignment_name}">"#
            ),
            format!(r#"                <taxonset id="{strain}" spec="TaxonSet">"#),
            format!(r#"                    <taxon id="{taxon}" spec="Taxon"/>"#),
            "                </taxonset>".to_string(),
            format!(
                r#"                <Uniform id="Uniform.{id}" lower="{}" name="distr" upper="{}"/>"#,
                bounds.lower, bounds.upper
            ),
            "            </distribution>".to_string(),
        ]
        .join("\n")
    }

    pub fn operator(&self, alignment_name: &str) -> String {
        let strain = &self.strain;
        format!(
            r#"        <operator id="tipDatesSampler{strain}" spec="TipDatesRandomWalker" taxonset="@{strain}" tree="@Tree.t:{alignment_name}" weight="1.0" windowSize="1.0"/>"#
        )
    }

    pub fn logger(&self) -> String {
        format!(r#"            <log idref="{}.prior"/>"#, self.strain)
    }
}

/// Generated fragments, each list in alignment order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipDateBlocks {
    pub priors: Vec<String>,
    pub operators: Vec<String>,
    pub loggers: Vec<String>,
}

impl TipDateBlocks {
    pub fn len(&self) -> usize {
        self.priors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }
}

/// Builds calibrations for every year-only header, numbering them from
/// `seed + 1` in iteration order. Other headers contribute nothing.
pub fn calibrations<'a>(
    headers: impl IntoIterator<Item = &'a AnnotatedHeader>,
    settings: &TemplateConfig,
) -> Result<Vec<TipCalibration>, PrepError> {
    let mut count = settings.calibration_seed;
    let mut items = Vec::new();
    for header in headers {
        if !header.has_year_only_date() {
            continue;
        }
        count += 1;
        let year_text = dates::year_component(&header.raw_date);
        let year: f64 = year_text
            .parse()
            .map_err(|_| PrepError::InvalidDate(header.raw_date.clone()))?;
        let calibration = TipCalibration {
            strain: header.strain.clone(),
            taxon: header.to_string(),
            bounds: DateBounds::for_year(year, settings.upper_bound_offset),
            id: count,
        };
        debug!(strain = %calibration.strain, id = count, "tip date calibration");
        items.push(calibration);
    }
    Ok(items)
}

pub fn generate_tip_date_blocks<'a>(
    headers: impl IntoIterator<Item = &'a AnnotatedHeader>,
    alignment_name: &str,
    settings: &TemplateConfig,
) -> Result<TipDateBlocks, PrepError> {
    let mut blocks = TipDateBlocks::default();
    for calibration in calibrations(headers, settings)? {
        blocks.priors.push(calibration.prior_block(alignment_name));
        blocks.operators.push(calibration.operator(alignment_name));
        blocks.loggers.push(calibration.logger());
    }
    Ok(blocks)
}

/// Latest decimal date across all headers, rounded to three places.
pub fn most_recent_tip<'a>(
    headers: impl IntoIterator<Item = &'a AnnotatedHeader>,
) -> Result<Option<f64>, PrepError> {
    let mut latest: Option<f64> = None;
    for header in headers {
        let value: f64 = header
            .decimal_date
            .parse()
            .map_err(|_| PrepError::InvalidDecimalDate {
                strain: header.strain.clone(),
                value: header.decimal_date.clone(),
            })?;
        latest = Some(latest.map_or(value, |current| current.max(value)));
    }
    Ok(latest.map(|value| (value * 1000.0).round() / 1000.0))
}
