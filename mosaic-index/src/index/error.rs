//! Error types for index rebuilding.

use std::fmt;

use thiserror::Error;

use super::cleaner::CleanError;
use super::descriptor::DescriptorError;
use crate::mosaic::MosaicError;
use crate::shapefile::ShapefileError;

/// Outcomes of the footprint builder that stop it from producing an index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The mosaic has no granules. Not a failure: nothing to index.
    #[error("no granules in mosaic, nothing to write")]
    NoGranules,

    /// No granule supplies both an envelope and a CRS.
    #[error("unable to determine CRS for mosaic: none of {granules} granules has an envelope with a CRS")]
    MissingCrs { granules: usize },
}

/// Pipeline step a rebuild failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStep {
    Validate,
    Clean,
    Build,
    Footprints,
    Descriptor,
}

impl fmt::Display for RebuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebuildStep::Validate => "validate",
            RebuildStep::Clean => "clean",
            RebuildStep::Build => "build",
            RebuildStep::Footprints => "footprints",
            RebuildStep::Descriptor => "descriptor",
        };
        f.write_str(name)
    }
}

/// Root causes of a failed rebuild.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The mosaic itself is unusable (e.g. an invalid name).
    #[error(transparent)]
    Mosaic(#[from] MosaicError),

    /// Stale artifacts could not be removed.
    #[error(transparent)]
    Clean(#[from] CleanError),

    /// No granule supplies a reference CRS.
    #[error("unable to determine CRS: none of {granules} granules has an envelope with a CRS")]
    MissingCrs { granules: usize },

    /// The reference granule has no usable pixel dimensions.
    #[error("reference granule {location} has no pixel dimensions, cannot derive resolution")]
    MissingPixelGeometry { location: String },

    /// Writing the footprint dataset failed.
    #[error("failed to write footprint dataset: {0}")]
    WriteFailure(#[from] ShapefileError),

    /// Writing the descriptor failed.
    #[error("failed to write descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
}

/// A failed rebuild, tagged with the mosaic and the step that failed.
#[derive(Debug, Error)]
#[error("rebuild of mosaic '{mosaic}' failed during {step}: {cause}")]
pub struct RebuildError {
    pub mosaic: String,
    pub step: RebuildStep,
    #[source]
    pub cause: IndexError,
}

impl RebuildError {
    pub(crate) fn new(mosaic: &str, step: RebuildStep, cause: impl Into<IndexError>) -> Self {
        Self {
            mosaic: mosaic.to_string(),
            step,
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_rebuild_error_display_names_mosaic_and_step() {
        let err = RebuildError::new(
            "ortho",
            RebuildStep::Build,
            IndexError::MissingCrs { granules: 3 },
        );
        let msg = err.to_string();
        assert!(msg.contains("'ortho'"));
        assert!(msg.contains("during build"));
        assert!(msg.contains("none of 3 granules"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_missing_pixel_geometry_display() {
        let err = IndexError::MissingPixelGeometry {
            location: "a.tif".to_string(),
        };
        assert!(err.to_string().contains("a.tif"));
    }

    #[test]
    fn test_build_error_display() {
        assert!(BuildError::NoGranules.to_string().contains("no granules"));
        assert!(BuildError::MissingCrs { granules: 2 }
            .to_string()
            .contains("CRS"));
    }

    #[test]
    fn test_step_display() {
        assert_eq!(RebuildStep::Footprints.to_string(), "footprints");
        assert_eq!(RebuildStep::Descriptor.to_string(), "descriptor");
    }
}
