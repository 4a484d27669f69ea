//! Common types and utilities shared across CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use mosaic_index::config::ConfigFile;
use mosaic_index::mosaic::TimeMode;
use tracing::debug;

use crate::error::CliError;

/// Time mode selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum TimeModeArg {
    /// Granules are not time-indexed
    None,
    /// One acquisition time per granule, parsed from the file name
    Timestamp,
    /// Granules cover a time range anchored at their file-name timestamp
    Range,
}

impl From<TimeModeArg> for TimeMode {
    fn from(arg: TimeModeArg) -> Self {
        match arg {
            TimeModeArg::None => TimeMode::None,
            TimeModeArg::Timestamp => TimeMode::Timestamp,
            TimeModeArg::Range => TimeMode::Range,
        }
    }
}

/// Arguments locating a mosaic on disk.
#[derive(Debug, Clone, Args)]
pub struct MosaicArgs {
    /// Mosaic directory holding the granule images
    pub dir: PathBuf,

    /// Mosaic name used for artifact file names (default: directory name)
    #[arg(long)]
    pub name: Option<String>,
}

/// Load the configuration file, from `path` or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Resolve the mosaic name: CLI flag, then config file, then the
/// directory's own name.
pub fn resolve_name(args: &MosaicArgs, config: &ConfigFile) -> Result<String, CliError> {
    if let Some(name) = args.name.clone().or_else(|| config.mosaic.name.clone()) {
        return Ok(name);
    }

    let canonical = fs::canonicalize(&args.dir)
        .map_err(|_| CliError::InvalidArgument(format!("{} does not exist", args.dir.display())))?;
    let name = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "cannot derive a mosaic name from {}, use --name",
                canonical.display()
            ))
        })?;
    debug!(name = %name, "Mosaic name taken from directory");
    Ok(name)
}
