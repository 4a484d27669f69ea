//! Rebuild orchestration.
//!
//! A rebuild runs the steps in order: validate the mosaic name, clean stale
//! artifacts, build the footprint index, persist it, then write the
//! descriptor. The first fatal error aborts the remaining steps. Nothing is
//! rolled back, but every step overwrites what it produces, so a failed
//! rebuild is repaired by running it again.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::builder::{FootprintIndex, FootprintIndexBuilder};
use super::cleaner::{self, DESCRIPTOR_EXTENSION};
use super::descriptor::MosaicDescriptor;
use super::error::{BuildError, IndexError, RebuildError, RebuildStep};
use crate::config::IndexConfig;
use crate::geo::Envelope;
use crate::mosaic::{validate_name, Mosaic};
use crate::shapefile::FootprintWriter;

/// What a successful rebuild did.
#[derive(Debug, Clone, PartialEq)]
pub enum RebuildOutcome {
    /// The mosaic has no granules; artifacts were cleaned and nothing written.
    Skipped,
    /// The index was written.
    Written(IndexSummary),
}

/// Summary of a written index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    pub record_count: u32,
    /// Aggregate envelope of all footprints.
    pub envelope: Envelope,
    /// Resolution written to the descriptor, `(x, y)`.
    pub resolution: (f64, f64),
    pub time_enabled: bool,
    pub footprint_path: PathBuf,
    pub descriptor_path: PathBuf,
    /// Stale artifacts removed before writing.
    pub removed: Vec<PathBuf>,
}

/// Index maintenance for one mosaic.
///
/// # Example
///
/// ```no_run
/// use mosaic_index::config::IndexConfig;
/// use mosaic_index::index::{MosaicIndex, RebuildOutcome};
/// use mosaic_index::mosaic::{DirectoryMosaic, DiscoveryOptions};
///
/// let mosaic = DirectoryMosaic::open("/data/ortho", &DiscoveryOptions::default())?;
/// match MosaicIndex::new(&mosaic, IndexConfig::default()).rebuild()? {
///     RebuildOutcome::Written(summary) => println!("{} footprints", summary.record_count),
///     RebuildOutcome::Skipped => println!("empty mosaic"),
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MosaicIndex<'a> {
    mosaic: &'a dyn Mosaic,
    config: IndexConfig,
}

impl<'a> MosaicIndex<'a> {
    pub fn new(mosaic: &'a dyn Mosaic, config: IndexConfig) -> Self {
        Self { mosaic, config }
    }

    /// Path of the `.shp` footprint component.
    pub fn footprint_path(&self) -> PathBuf {
        self.artifact_path("shp")
    }

    /// Path of the descriptor.
    pub fn descriptor_path(&self) -> PathBuf {
        self.artifact_path(DESCRIPTOR_EXTENSION)
    }

    fn artifact_path(&self, ext: &str) -> PathBuf {
        self.mosaic
            .root_dir()
            .join(format!("{}.{}", self.mosaic.name(), ext))
    }

    /// Remove stale artifacts without rebuilding.
    pub fn clean(&self) -> Result<Vec<PathBuf>, RebuildError> {
        let name = self.mosaic.name();
        validate_name(name).map_err(|e| RebuildError::new(name, RebuildStep::Validate, e))?;
        cleaner::clean(self.mosaic).map_err(|e| RebuildError::new(name, RebuildStep::Clean, e))
    }

    /// Regenerate the footprint dataset and descriptor from scratch.
    pub fn rebuild(&self) -> Result<RebuildOutcome, RebuildError> {
        let name = self.mosaic.name();
        let fail =
            |step: RebuildStep| move |cause: IndexError| RebuildError::new(name, step, cause);
        info!(
            mosaic = name,
            dir = %self.mosaic.root_dir().display(),
            time_mode = %self.mosaic.time_mode(),
            "Rebuilding mosaic index"
        );

        let removed = self.clean()?;
        debug!(mosaic = name, removed = removed.len(), "Cleaned stale artifacts");

        let index = match FootprintIndexBuilder::new(self.config.clone()).build(self.mosaic) {
            Ok(index) => index,
            Err(BuildError::NoGranules) => {
                warn!(mosaic = name, "No granules found, index not written");
                return Ok(RebuildOutcome::Skipped);
            }
            Err(BuildError::MissingCrs { granules }) => {
                return Err(fail(RebuildStep::Build)(IndexError::MissingCrs { granules }));
            }
        };

        let descriptor = descriptor_for(&index).map_err(fail(RebuildStep::Build))?;

        let record_count = self
            .write_footprints(&index)
            .map_err(fail(RebuildStep::Footprints))?;

        let descriptor_path = self.descriptor_path();
        descriptor
            .write_to(&descriptor_path)
            .map_err(|e| fail(RebuildStep::Descriptor)(e.into()))?;

        let summary = IndexSummary {
            record_count,
            envelope: index.envelope,
            resolution: (descriptor.resolution_x, descriptor.resolution_y),
            time_enabled: index.schema.has_time(),
            footprint_path: self.footprint_path(),
            descriptor_path,
            removed,
        };
        info!(
            mosaic = name,
            records = summary.record_count,
            envelope = %summary.envelope,
            levels = %descriptor.levels_value(),
            "Mosaic index written"
        );

        Ok(RebuildOutcome::Written(summary))
    }

    fn write_footprints(&self, index: &FootprintIndex) -> Result<u32, IndexError> {
        let mut writer = FootprintWriter::create(
            self.mosaic.root_dir(),
            &index.schema,
            self.config.write_codepage,
        )?;
        for record in &index.records {
            writer.write_record(record)?;
        }
        let summary = writer.finish(&index.envelope)?;
        Ok(summary.record_count)
    }
}

fn descriptor_for(index: &FootprintIndex) -> Result<MosaicDescriptor, IndexError> {
    let reference = &index.reference;
    reference
        .pixel_size
        .and_then(|pixel_size| {
            MosaicDescriptor::from_reference(
                index.schema.name(),
                &reference.envelope,
                pixel_size,
                index.schema.has_time(),
            )
        })
        .ok_or_else(|| IndexError::MissingPixelGeometry {
            location: reference.location.clone(),
        })
}
