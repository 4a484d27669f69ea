//! Granules: the individual raster tiles that make up a mosaic.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::geo::{Crs, Envelope};

/// Pixel dimensions of a granule's raster grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl PixelSize {
    /// Create pixel dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One source tile of a mosaic.
///
/// Built once by a [`Mosaic`](crate::mosaic::Mosaic) implementation and never
/// modified afterwards.
///
/// # Example
///
/// ```
/// use mosaic_index::geo::{Crs, Envelope};
/// use mosaic_index::granule::{Granule, PixelSize};
///
/// let granule = Granule::new("/data/mosaic/tile_0_0.tif")
///     .with_envelope(Envelope::new(0.0, 0.0, 1.0, 1.0))
///     .with_crs(Crs::epsg(4326))
///     .with_pixel_size(PixelSize::new(256, 256));
///
/// assert_eq!(granule.location(), "tile_0_0.tif");
/// assert!(granule.reference_extent().is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Granule {
    file_ref: PathBuf,
    envelope: Option<Envelope>,
    crs: Option<Crs>,
    pixel_size: Option<PixelSize>,
    timestamp: Option<DateTime<Utc>>,
}

impl Granule {
    /// Create a granule with only a file reference.
    pub fn new(file_ref: impl Into<PathBuf>) -> Self {
        Self {
            file_ref: file_ref.into(),
            envelope: None,
            crs: None,
            pixel_size: None,
            timestamp: None,
        }
    }

    /// Set the geographic envelope.
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    /// Set the CRS the envelope is expressed in.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Set the raster grid dimensions.
    pub fn with_pixel_size(mut self, pixel_size: PixelSize) -> Self {
        self.pixel_size = Some(pixel_size);
        self
    }

    /// Set the acquisition time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Path to the tile data.
    pub fn file_ref(&self) -> &Path {
        &self.file_ref
    }

    /// Geographic envelope, if known.
    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    /// CRS of the envelope, if known.
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Raster grid dimensions, if known.
    pub fn pixel_size(&self) -> Option<PixelSize> {
        self.pixel_size
    }

    /// Acquisition time, if known.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Envelope and CRS together, only when both are present.
    ///
    /// A granule with a reference extent can anchor the mosaic's CRS.
    pub fn reference_extent(&self) -> Option<(&Envelope, &Crs)> {
        match (&self.envelope, &self.crs) {
            (Some(envelope), Some(crs)) => Some((envelope, crs)),
            _ => None,
        }
    }

    /// File name stored in the footprint `location` attribute.
    ///
    /// Falls back to the full path when it has no final component.
    pub fn location(&self) -> String {
        self.file_ref
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_ref.display().to_string())
    }
}
