//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use mosaic_index::config::ConfigFileError;
use mosaic_index::index::{DescriptorError, IndexError, RebuildError};
use mosaic_index::mosaic::MosaicError;
use mosaic_index::shapefile::ShapefileError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be used
    Config(ConfigFileError),
    /// Invalid command-line value
    InvalidArgument(String),
    /// Mosaic directory could not be opened
    Mosaic(MosaicError),
    /// Rebuild or clean failed
    Rebuild(RebuildError),
    /// Existing descriptor could not be read
    Descriptor(DescriptorError),
    /// Existing footprint dataset could not be read
    Dataset(ShapefileError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Rebuild(RebuildError {
                cause: IndexError::MissingCrs { .. },
                ..
            }) => {
                eprintln!();
                eprintln!("No granule has both a world file and a CRS. Either:");
                eprintln!("  1. Place a .prj file next to each image, or");
                eprintln!("  2. Pass a default CRS with --crs EPSG:<code>, or");
                eprintln!("  3. Set default_crs in the [mosaic] section of config.ini");
            }
            CliError::Rebuild(RebuildError {
                cause: IndexError::MissingPixelGeometry { .. },
                ..
            }) => {
                eprintln!();
                eprintln!("The first georeferenced image could not be decoded.");
                eprintln!("Check that it is a readable TIFF, PNG or JPEG file.");
            }
            CliError::Mosaic(MosaicError::InvalidName(_)) => {
                eprintln!();
                eprintln!("Mosaic names become file names: use --name with a plain name.");
            }
            CliError::Descriptor(_) | CliError::Dataset(_) => {
                eprintln!();
                eprintln!("Run 'mosaic-index rebuild <DIR>' to create the index first.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Mosaic(e) => write!(f, "Failed to open mosaic: {}", e),
            CliError::Rebuild(e) => write!(f, "{}", e),
            CliError::Descriptor(e) => write!(f, "Failed to read descriptor: {}", e),
            CliError::Dataset(e) => write!(f, "Failed to read footprints: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Mosaic(e) => Some(e),
            CliError::Rebuild(e) => Some(e),
            CliError::Descriptor(e) => Some(e),
            CliError::Dataset(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<MosaicError> for CliError {
    fn from(e: MosaicError) -> Self {
        CliError::Mosaic(e)
    }
}

impl From<RebuildError> for CliError {
    fn from(e: RebuildError) -> Self {
        CliError::Rebuild(e)
    }
}

impl From<DescriptorError> for CliError {
    fn from(e: DescriptorError) -> Self {
        CliError::Descriptor(e)
    }
}

impl From<ShapefileError> for CliError {
    fn from(e: ShapefileError) -> Self {
        CliError::Dataset(e)
    }
}
