//! Errors raised while opening or scanning a mosaic.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while discovering a mosaic's granules.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// The mosaic directory does not exist or is not a directory.
    #[error("mosaic directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The mosaic name cannot be used as an artifact base name.
    #[error("invalid mosaic name '{0}': must be non-empty and contain no path separators")]
    InvalidName(String),

    /// Unknown time mode string.
    #[error("invalid time mode '{0}': expected none, timestamp or range")]
    InvalidTimeMode(String),

    /// A world file could not be parsed.
    #[error("invalid world file {}: {reason}", path.display())]
    InvalidWorldFile { path: PathBuf, reason: String },

    /// The timestamp pattern is not a valid regular expression.
    #[error("invalid timestamp pattern: {0}")]
    InvalidTimestampPattern(#[from] regex::Error),

    /// The directory could not be scanned.
    #[error("invalid granule search pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Failed to read a file or directory.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
