use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{PrepConfig, TemplateConfig};
use crate::dates;
use crate::domain::{AnnotatedHeader, HEADER_FIELD_COUNT};
use crate::error::PrepError;
use crate::fasta::{self, Alignment};
use crate::output::{self, AtomicOutput, BuildSummary};
use crate::tip_dates::{self, TipDateBlocks};

/// What a template line asks for. Checked in declaration order; the first
/// match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLine {
    /// `id="` opens the alignment element; replaced by the generated one.
    Alignment,
    /// Type trait set; replaced by one `taxon=trait field` pair per strain.
    TypeTrait,
    /// Date trait set; replaced by one `taxon=decimal date` pair per strain.
    DateTrait,
    TipPriors,
    TipOperators,
    TipLoggers,
    /// Static alignment attributes and sequences already in the template.
    Skip,
    Copy,
}

impl TemplateLine {
    pub fn classify(line: &str, settings: &TemplateConfig) -> Self {
        if line.starts_with(&settings.alignment_prefix) {
            TemplateLine::Alignment
        } else if line.starts_with(&settings.type_trait_prefix) {
            TemplateLine::TypeTrait
        } else if line.starts_with(&settings.date_trait_prefix) {
            TemplateLine::DateTrait
        } else if line.contains(&settings.prior_marker) {
            TemplateLine::TipPriors
        } else if line.contains(&settings.operator_marker) {
            TemplateLine::TipOperators
        } else if line.contains(&settings.logger_marker) {
            TemplateLine::TipLoggers
        } else if settings
            .skip_prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
        {
            TemplateLine::Skip
        } else {
            TemplateLine::Copy
        }
    }
}

/// One annotated sequence as keyed in the input alignment.
#[derive(Debug, Clone)]
pub struct TaxonSequence {
    pub header: AnnotatedHeader,
    pub taxon: String,
    pub sequence: String,
}

/// Parses every alignment id as an annotated header.
pub fn taxa_from_alignment(alignment: &Alignment) -> Result<Vec<TaxonSequence>, PrepError> {
    alignment
        .iter()
        .map(|(id, sequence)| -> Result<TaxonSequence, PrepError> {
            Ok(TaxonSequence {
                header: id.parse()?,
                taxon: id.to_string(),
                sequence: sequence.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub lines_copied: usize,
    pub lines_skipped: usize,
    pub blocks_inserted: usize,
}

pub struct BeastXml<'a> {
    taxa: &'a [TaxonSequence],
    alignment_name: &'a str,
    template_alignment_name: &'a str,
    settings: &'a TemplateConfig,
    tip_dates: TipDateBlocks,
}

impl<'a> BeastXml<'a> {
    pub fn new(
        taxa: &'a [TaxonSequence],
        alignment_name: &'a str,
        template_alignment_name: &'a str,
        settings: &'a TemplateConfig,
    ) -> Result<Self, PrepError> {
        if settings.trait_field >= HEADER_FIELD_COUNT {
            return Err(PrepError::ConfigParse(format!(
                "trait_field {} is outside the {HEADER_FIELD_COUNT} header fields",
                settings.trait_field
            )));
        }
        let tip_dates = tip_dates::generate_tip_date_blocks(
            taxa.iter().map(|taxon| &taxon.header),
            alignment_name,
            settings,
        )?;
        Ok(Self {
            taxa,
            alignment_name,
            template_alignment_name,
            settings,
            tip_dates,
        })
    }

    pub fn tip_dates(&self) -> &TipDateBlocks {
        &self.tip_dates
    }

    /// The `<data>` attributes and one `<sequence>` per taxon.
    pub fn alignment_block(&self) -> String {
        let sequences = self
            .taxa
            .iter()
            .map(|taxon| {
                format!(
                    r#"        <sequence id="seq_{0}" taxon="{0}" totalcount="4" value="{1}"/>"#,
                    taxon.taxon, taxon.sequence
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "id=\"{}\"\nspec=\"Alignment\"\nname=\"alignment\">\n{sequences}\n",
            self.alignment_name
        )
    }

    pub fn type_trait_block(&self) -> String {
        let pairs = self
            .taxa
            .iter()
            .map(|taxon| {
                let value = taxon
                    .header
                    .field(self.settings.trait_field)
                    .unwrap_or_default();
                format!("{}={value}", taxon.taxon)
            })
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}{}\" spec=\"mascot.util.InitializedTraitSet\" traitname=\"type\" value=\"{pairs}\">\n",
            self.settings.type_trait_prefix, self.alignment_name
        )
    }

    /// Year-only dates sit at mid-year (`YYYY.5`); others use the header's
    /// decimal date verbatim.
    pub fn date_trait_block(&self) -> String {
        let pairs = self
            .taxa
            .iter()
            .map(|taxon| {
                let header = &taxon.header;
                if header.has_year_only_date() {
                    format!("{}={}.5", taxon.taxon, dates::year_component(&header.raw_date))
                } else {
                    format!("{}={}", taxon.taxon, header.decimal_date)
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}{}\" spec=\"beast.base.evolution.tree.TraitSet\" traitname=\"date\" value=\"{pairs}\">\n",
            self.settings.date_trait_prefix, self.alignment_name
        )
    }

    /// Text emitted for one template line (terminator included).
    pub fn render_line(&self, line: &str) -> (TemplateLine, Option<String>) {
        let kind = TemplateLine::classify(line, self.settings);
        let text = match kind {
            TemplateLine::Alignment => Some(self.alignment_block()),
            TemplateLine::TypeTrait => Some(self.type_trait_block()),
            TemplateLine::DateTrait => Some(self.date_trait_block()),
            TemplateLine::TipPriors => {
                Some(format!("{line}\n{}\n", self.tip_dates.priors.join("\n")))
            }
            TemplateLine::TipOperators => {
                Some(format!("{line}{}\n", self.tip_dates.operators.join("\n")))
            }
            TemplateLine::TipLoggers => {
                Some(format!("{line}{}\n", self.tip_dates.loggers.join("\n")))
            }
            TemplateLine::Skip => None,
            TemplateLine::Copy => Some(self.rename(line)),
        };
        (kind, text)
    }

    fn rename(&self, line: &str) -> String {
        if self.template_alignment_name.is_empty() {
            line.to_string()
        } else {
            line.replace(self.template_alignment_name, self.alignment_name)
        }
    }

    pub fn render<W: Write>(
        &self,
        template: &str,
        writer: &mut W,
        dest: &Path,
    ) -> Result<RenderStats, PrepError> {
        let mut stats = RenderStats::default();
        for line in template.split_inclusive('\n') {
            let (kind, text) = self.render_line(line);
            match kind {
                TemplateLine::Copy => stats.lines_copied += 1,
                TemplateLine::Skip => stats.lines_skipped += 1,
                other => {
                    debug!(trigger = ?other, "inserting generated block");
                    stats.blocks_inserted += 1;
                }
            }
            if let Some(text) = text {
                writer
                    .write_all(text.as_bytes())
                    .map_err(|err| output::write_err(dest, err))?;
            }
        }
        Ok(stats)
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub input_alignment: PathBuf,
    pub alignment_name: String,
    pub output_file: PathBuf,
    pub template_xml: PathBuf,
    pub template_alignment_name: String,
}

pub fn run_build(options: &BuildOptions, config: &PrepConfig) -> Result<BuildSummary, PrepError> {
    let mut output = AtomicOutput::create(&options.output_file)?;
    let records = fasta::read_fasta(&options.input_alignment)?;
    let alignment = Alignment::from_records(records);
    let taxa = taxa_from_alignment(&alignment)?;

    let most_recent_tip = tip_dates::most_recent_tip(taxa.iter().map(|taxon| &taxon.header))?;
    if let Some(tip) = most_recent_tip {
        info!(most_recent_tip = tip, "most recent tip date");
    }

    let template = fs::read_to_string(&options.template_xml).map_err(|err| {
        PrepError::Filesystem(format!("read {}: {err}", options.template_xml.display()))
    })?;

    let xml = BeastXml::new(
        &taxa,
        &options.alignment_name,
        &options.template_alignment_name,
        &config.template,
    )?;
    info!(
        sequences = taxa.len(),
        tip_calibrations = xml.tip_dates().len(),
        "rendering BEAST XML"
    );

    let stats = xml.render(&template, output.writer(), &options.output_file)?;
    let path = output.commit()?;
    debug!(?stats, "template rendered");

    Ok(BuildSummary {
        output: path.display().to_string(),
        alignment_name: options.alignment_name.clone(),
        sequences: taxa.len(),
        tip_calibrations: xml.tip_dates().len(),
        most_recent_tip,
    })
}
