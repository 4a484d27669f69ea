//! Footprint index maintenance.
//!
//! This module rebuilds the two artifacts a mosaic reader needs: the
//! footprint dataset (`<name>.shp` and its sidecars, one polygon per
//! granule) and the descriptor (`<name>.properties`).
//!
//! # Pipeline
//!
//! ```text
//! validate name ─► clean ─► build ─► write footprints ─► write descriptor
//!                              │
//!                              └─ no granules: warn, stop
//! ```
//!
//! [`MosaicIndex::rebuild`] runs the whole pipeline; the pieces are public
//! for callers that need only one of them.

mod builder;
mod cleaner;
mod descriptor;
mod error;
mod rebuild;
mod schema;

pub use builder::{FootprintIndex, FootprintIndexBuilder, ReferenceGranule};
pub use cleaner::{clean, clean_dir, is_artifact, CleanError, DESCRIPTOR_EXTENSION, SAMPLE_IMAGE};
pub use descriptor::{keys, DescriptorError, MosaicDescriptor};
pub use error::{BuildError, IndexError, RebuildError, RebuildStep};
pub use rebuild::{IndexSummary, MosaicIndex, RebuildOutcome};
pub use schema::{
    Attribute, AttributeKind, FootprintRecord, FootprintSchema, GEOMETRY_ATTRIBUTE,
    LOCATION_ATTRIBUTE, TIME_ATTRIBUTE,
};
