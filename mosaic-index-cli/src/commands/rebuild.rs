//! `rebuild` command: scan a mosaic directory and regenerate its index.

use clap::Args;
use mosaic_index::config::ConfigFile;
use mosaic_index::geo::Crs;
use mosaic_index::index::{IndexSummary, MosaicIndex, RebuildOutcome};
use mosaic_index::mosaic::{DirectoryMosaic, Mosaic};
use tracing::info;

use super::common::{resolve_name, MosaicArgs, TimeModeArg};
use crate::error::CliError;

/// Arguments for `rebuild`.
#[derive(Debug, Args)]
pub struct RebuildArgs {
    #[command(flatten)]
    pub mosaic: MosaicArgs,

    /// How granule times are indexed (default: from config, else none)
    #[arg(long, value_enum)]
    pub time_mode: Option<TimeModeArg>,

    /// CRS for images without a .prj sidecar, e.g. EPSG:4326
    #[arg(long)]
    pub crs: Option<String>,

    /// Leave images without a world file out of the index
    #[arg(long)]
    pub skip_null_envelopes: bool,
}

/// Run the rebuild command.
pub fn run(args: RebuildArgs, mut config: ConfigFile) -> Result<(), CliError> {
    // Command-line values take precedence over the config file
    config.mosaic.name = Some(resolve_name(&args.mosaic, &config)?);
    if let Some(mode) = args.time_mode {
        config.mosaic.time_mode = mode.into();
    }
    if let Some(crs) = &args.crs {
        if crs.trim().is_empty() {
            return Err(CliError::InvalidArgument("--crs must not be empty".to_string()));
        }
        config.mosaic.default_crs = Some(Crs::new(crs.as_str()));
    }
    if args.skip_null_envelopes {
        config.mosaic.skip_null_envelopes = true;
    }

    let options = config.discovery_options()?;
    let mosaic = DirectoryMosaic::open(&args.mosaic.dir, &options)?;
    info!(
        mosaic = mosaic.name(),
        granules = mosaic.len(),
        "Opened mosaic directory"
    );

    let outcome = MosaicIndex::new(&mosaic, config.index_config()).rebuild()?;
    match outcome {
        RebuildOutcome::Skipped => {
            println!(
                "No granules found in {}; index not written.",
                args.mosaic.dir.display()
            );
        }
        RebuildOutcome::Written(summary) => print_summary(mosaic.name(), &summary),
    }
    Ok(())
}

fn print_summary(name: &str, summary: &IndexSummary) {
    println!("Rebuilt index for mosaic '{}'", name);
    println!("  Footprints:  {}", summary.record_count);
    println!("  Envelope:    {}", summary.envelope);
    println!(
        "  Resolution:  {:.6}, {:.6}",
        summary.resolution.0, summary.resolution.1
    );
    println!(
        "  Time:        {}",
        if summary.time_enabled { "indexed" } else { "not indexed" }
    );
    if !summary.removed.is_empty() {
        println!("  Removed:     {} stale artifact(s)", summary.removed.len());
    }
    println!("  Dataset:     {}", summary.footprint_path.display());
    println!("  Descriptor:  {}", summary.descriptor_path.display());
}
