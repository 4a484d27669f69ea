//! Minimal ESRI shapefile support for footprint datasets.
//!
//! A footprint dataset is a shapefile set sharing one base name:
//!
//! | Component | Contents                                         |
//! |-----------|--------------------------------------------------|
//! | `.shp`    | polygon footprints (or null shapes)              |
//! | `.shx`    | record offsets into `.shp`                       |
//! | `.dbf`    | dBase III attribute table (`location`, `time`)   |
//! | `.prj`    | WKT of the reference CRS                         |
//! | `.cpg`    | code page of the attribute table                 |
//!
//! Only what the mosaic reader needs is implemented: rectangular polygons,
//! null shapes, character and date attributes.

pub mod dbf;
mod reader;
pub mod shp;
mod writer;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use reader::{read_dataset, StoredDataset, StoredRecord};
pub use writer::{DatasetSummary, FootprintWriter};

/// Extensions of every file that may belong to a shapefile set.
///
/// Includes spatial index and metadata sidecars written by other tools so
/// that cleanup removes them too.
pub const COMPONENT_EXTENSIONS: &[&str] = &[
    "shp", "shx", "dbf", "prj", "qix", "fix", "cpg", "sbn", "sbx", "shp.xml",
];

/// Code page written to the `.cpg` component.
pub const CODE_PAGE: &str = "UTF-8";

/// Errors raised while reading or writing a shapefile set.
#[derive(Debug, Error)]
pub enum ShapefileError {
    /// An I/O operation on one of the component files failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A component file is malformed.
    #[error("invalid shapefile component {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    /// The dataset exceeds a format limit.
    #[error("shapefile limit exceeded: {0}")]
    LimitExceeded(String),
}

impl ShapefileError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ShapefileError::Io { path, source }
    }

    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ShapefileError::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
