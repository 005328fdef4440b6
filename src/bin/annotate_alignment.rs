use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use beast_tipdate_prep::annotate::{AnnotateOptions, run_annotate};
use beast_tipdate_prep::config::ConfigLoader;
use beast_tipdate_prep::error::PrepError;
use beast_tipdate_prep::output::JsonOutput;

#[derive(Parser)]
#[command(name = "annotate-alignment")]
#[command(about = "Join strain metadata and furin annotations onto FASTA headers")]
#[command(version, author)]
struct Cli {
    /// Alignment FASTA whose headers are strain names
    #[arg(long = "input_alignment")]
    input_alignment: Utf8PathBuf,

    /// Tab-separated metadata with a header row naming the columns
    #[arg(long = "metadata_file")]
    metadata_file: Utf8PathBuf,

    /// Annotated FASTA to write (replaced if present)
    #[arg(long = "output_file")]
    output_file: Utf8PathBuf,

    /// JSON with furin cleavage motif classifications
    #[arg(long = "furin_annotations_file")]
    furin_annotations_file: Utf8PathBuf,

    /// JSON with furin cleavage site sequences
    #[arg(long = "furin_seqs")]
    furin_seqs: Utf8PathBuf,

    /// Pipe-delimited list whose first field names strains to leave out
    #[arg(long = "exclude_list")]
    exclude_list: Option<Utf8PathBuf>,

    /// JSON overriding column and field names
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
    let options = AnnotateOptions {
        input_alignment: cli.input_alignment.into_std_path_buf(),
        metadata_file: cli.metadata_file.into_std_path_buf(),
        output_file: cli.output_file.into_std_path_buf(),
        furin_annotations_file: cli.furin_annotations_file.into_std_path_buf(),
        furin_seqs: cli.furin_seqs.into_std_path_buf(),
        exclude_list: cli.exclude_list.map(Utf8PathBuf::into_std_path_buf),
    };

    let summary = run_annotate(&options, &config)?;
    if cli.json {
        JsonOutput::print_annotate(&summary).into_diagnostic()?;
    } else {
        tracing::info!(
            written = summary.records_written,
            excluded = summary.records_excluded,
            output = %summary.output,
            "annotation complete"
        );
    }
    Ok(())
}
