use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use beast_tipdate_prep::config::ConfigLoader;
use beast_tipdate_prep::error::PrepError;
use beast_tipdate_prep::output::JsonOutput;
use beast_tipdate_prep::template::{BuildOptions, run_build};

#[derive(Parser)]
#[command(name = "build-beast-xml")]
#[command(about = "Insert an annotated alignment, traits and tip-date priors into a BEAST XML template")]
#[command(version, author)]
struct Cli {
    /// Annotated FASTA produced by annotate-alignment
    #[arg(long = "input_alignment")]
    input_alignment: Utf8PathBuf,

    /// Alignment and tree name used in the generated XML
    #[arg(long = "alignment_name")]
    alignment_name: String,

    /// BEAST XML to write (replaced if present)
    #[arg(long = "output_file")]
    output_file: Utf8PathBuf,

    #[arg(long = "template_xml")]
    template_xml: Utf8PathBuf,

    /// Alignment name used in the template, replaced throughout
    #[arg(long = "template_alignment_name")]
    template_alignment_name: String,

    /// JSON overriding template markers and calibration constants
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Print a JSON run summary to stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PrepError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PrepError) -> u8 {
    match error {
        PrepError::MissingStrain { .. } => 2,
        err if err.is_input_error() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let options = BuildOptions {
        input_alignment: cli.input_alignment.into_std_path_buf(),
        alignment_name: cli.alignment_name,
        output_file: cli.output_file.into_std_path_buf(),
        template_xml: cli.template_xml.into_std_path_buf(),
        template_alignment_name: cli.template_alignment_name,
    };

    let summary = run_build(&options, &config)?;
    if cli.json {
        JsonOutput::print_build(&summary).into_diagnostic()?;
    } else {
        tracing::info!(
            sequences = summary.sequences,
            tip_calibrations = summary.tip_calibrations,
            output = %summary.output,
            "BEAST XML complete"
        );
    }
    Ok(())
}
