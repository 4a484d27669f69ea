//! ESRI world files (`.tfw`, `.pgw`, `.jgw`, `.wld`, ...).
//!
//! A world file holds six numbers, one per line:
//!
//! ```text
//! A  pixel size in x
//! D  rotation about y
//! B  rotation about x
//! E  pixel size in y (negative for north-up images)
//! C  x of the centre of the upper-left pixel
//! F  y of the centre of the upper-left pixel
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::MosaicError;
use crate::geo::Envelope;
use crate::granule::PixelSize;

/// Affine transform read from a world file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldFile {
    pub pixel_x: f64,
    pub rotation_y: f64,
    pub rotation_x: f64,
    pub pixel_y: f64,
    pub upper_left_x: f64,
    pub upper_left_y: f64,
}

impl WorldFile {
    /// Parse world file contents.
    pub fn parse(content: &str) -> Result<Self, String> {
        let values: Vec<f64> = content
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| format!("'{}' is not a number", token))
            })
            .collect::<Result<_, _>>()?;

        if values.len() != 6 {
            return Err(format!("expected 6 values, found {}", values.len()));
        }

        Ok(Self {
            pixel_x: values[0],
            rotation_y: values[1],
            rotation_x: values[2],
            pixel_y: values[3],
            upper_left_x: values[4],
            upper_left_y: values[5],
        })
    }

    /// Read and parse a world file from disk.
    pub fn load(path: &Path) -> Result<Self, MosaicError> {
        let content = fs::read_to_string(path).map_err(|source| MosaicError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|reason| MosaicError::InvalidWorldFile {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Whether the image is axis-aligned (no rotation terms).
    pub fn is_north_up(&self) -> bool {
        self.rotation_x == 0.0 && self.rotation_y == 0.0
    }

    /// Envelope covered by a raster of the given size.
    ///
    /// Returns `None` for rotated images; their footprint is not a rectangle.
    pub fn envelope(&self, pixel_size: PixelSize) -> Option<Envelope> {
        if !self.is_north_up() {
            return None;
        }

        // The transform references pixel centres; shift to the outer corner.
        let left = self.upper_left_x - self.pixel_x / 2.0;
        let top = self.upper_left_y - self.pixel_y / 2.0;
        let right = left + self.pixel_x * f64::from(pixel_size.width);
        let bottom = top + self.pixel_y * f64::from(pixel_size.height);

        let envelope = Envelope::new(left, bottom, right, top);
        envelope.is_finite().then_some(envelope)
    }
}

/// Candidate world-file paths for an image, most specific first.
///
/// For `tile.tif` this yields `tile.tfw`, `tile.tifw` and `tile.wld`, each
/// in lower and upper case.
pub(super) fn sidecar_candidates(image: &Path) -> Vec<PathBuf> {
    let Some(ext) = image.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
        return Vec::new();
    };

    let mut extensions = Vec::with_capacity(3);
    let mut chars = ext.chars();
    if let (Some(first), Some(last)) = (chars.next(), chars.next_back()) {
        extensions.push(format!("{}{}w", first, last));
    }
    extensions.push(format!("{}w", ext));
    extensions.push("wld".to_string());

    extensions
        .into_iter()
        .flat_map(|e| {
            let upper = e.to_uppercase();
            [image.with_extension(e), image.with_extension(upper)]
        })
        .collect()
}
