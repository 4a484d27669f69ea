//! Mosaic Index - footprint index maintenance for raster mosaics
//!
//! A raster mosaic is a directory of georeferenced image tiles (granules)
//! presented to readers as one coverage. Readers locate granules through two
//! artifacts kept next to them:
//!
//! - a footprint dataset `<name>.shp` (plus `.shx`, `.dbf`, `.prj`, `.cpg`)
//!   with one rectangle per granule, its file name and optionally its time
//! - a descriptor `<name>.properties` with the mosaic's native resolution
//!   and attribute names
//!
//! [`index::MosaicIndex::rebuild`] regenerates both from the granules of any
//! [`mosaic::Mosaic`].
//!
//! # Example
//!
//! ```no_run
//! use mosaic_index::config::IndexConfig;
//! use mosaic_index::geo::{Crs, Envelope};
//! use mosaic_index::granule::{Granule, PixelSize};
//! use mosaic_index::index::MosaicIndex;
//! use mosaic_index::mosaic::InMemoryMosaic;
//!
//! let mosaic = InMemoryMosaic::new("ortho", "/data/ortho").with_granule(
//!     Granule::new("/data/ortho/tile_0_0.tif")
//!         .with_envelope(Envelope::new(0.0, 0.0, 1.0, 1.0))
//!         .with_crs(Crs::epsg(4326))
//!         .with_pixel_size(PixelSize::new(256, 256)),
//! );
//!
//! MosaicIndex::new(&mosaic, IndexConfig::default()).rebuild()?;
//! # Ok::<(), mosaic_index::index::RebuildError>(())
//! ```

pub mod config;
pub mod geo;
pub mod granule;
pub mod index;
pub mod logging;
pub mod mosaic;
pub mod shapefile;
