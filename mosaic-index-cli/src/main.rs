//! Mosaic Index CLI - Command-line interface
//!
//! Rebuilds, cleans and inspects the footprint index of a raster mosaic
//! directory.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mosaic_index::logging::init_logging;
use tracing::debug;

use commands::common::{load_config, MosaicArgs};
use commands::rebuild::RebuildArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "mosaic-index")]
#[command(version, about = "Maintain footprint indexes of raster image mosaics", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.mosaic-index/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a mosaic directory and rebuild its footprint index and descriptor
    Rebuild(RebuildArgs),
    /// Remove a mosaic's index artifacts
    Clean(MosaicArgs),
    /// Print a mosaic's descriptor and footprints
    Inspect(MosaicArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;

    let log_path = config.logging.log_path();
    let _guard =
        init_logging(log_path.as_deref()).map_err(|e| CliError::LoggingInit(e.to_string()))?;
    debug!(config = ?cli.config, "Configuration loaded");

    match cli.command {
        Command::Rebuild(args) => commands::rebuild::run(args, config),
        Command::Clean(args) => commands::clean::run(args, config),
        Command::Inspect(args) => commands::inspect::run(args, config),
    }
}
