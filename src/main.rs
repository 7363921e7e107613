use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use mitoref::driver::{self, RunArgs};
use mitoref::engine::{self, EngineConfig};
use mitoref::error::PipelineError;
use mitoref::registry;

#[derive(Parser)]
#[command(name = "mitoref")]
#[command(
    about = "Combine mitochondrial reference datasets into one keyed table",
    long_about = None
)]
struct Cli {
    /// Reference dataset list, separated with commas, e.g. gnomad,mitomap,clinvar.
    #[arg(short = 'd', long)]
    dataset: String,

    /// Path for the combined reference dataset artifact.
    #[arg(short = 'o', long)]
    output_path: PathBuf,

    /// Force write to an existing output path.
    #[arg(short = 'f', long)]
    force_write: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = engine::init(&EngineConfig::default()) {
        error!("{err}");
        return ExitCode::FAILURE;
    }

    let args = RunArgs {
        datasets: cli.dataset,
        output_path: cli.output_path,
        force_write: cli.force_write,
    };
    match driver::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ PipelineError::UnsupportedDatasets { .. }) => {
            error!("{err}; known datasets: {}", registry::names().join(","));
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
