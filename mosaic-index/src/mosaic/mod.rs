//! Mosaics: named, directory-backed collections of granules.
//!
//! The index builder never discovers granules itself. It consumes anything
//! implementing [`Mosaic`], which supplies the mosaic's identity, its time
//! mode and a restartable granule enumeration. Two implementations ship
//! with the crate:
//!
//! - [`InMemoryMosaic`] wraps a caller-supplied granule list
//! - [`DirectoryMosaic`] scans a directory for images with world-file and
//!   `.prj` sidecars

mod directory;
mod error;
mod timestamp;
mod world_file;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub(crate) use directory::validate_name;
pub use directory::{DirectoryMosaic, DiscoveryOptions, IMAGE_EXTENSIONS};
pub use error::MosaicError;
pub use timestamp::{
    TimestampParser, DEFAULT_DATETIME_FORMAT, DEFAULT_TIME_FORMAT, DEFAULT_TIME_REGEX,
};
pub use world_file::WorldFile;

use crate::granule::Granule;

/// How granule timestamps are exposed by the mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeMode {
    /// Granules are not time-indexed.
    #[default]
    None,
    /// Each granule has a single acquisition instant.
    Timestamp,
    /// Granules describe a time range anchored at their timestamp.
    Range,
}

impl TimeMode {
    /// Whether the footprint schema carries a time attribute.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, TimeMode::None)
    }
}

impl fmt::Display for TimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeMode::None => "none",
            TimeMode::Timestamp => "timestamp",
            TimeMode::Range => "range",
        };
        f.write_str(name)
    }
}

impl FromStr for TimeMode {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(TimeMode::None),
            "timestamp" => Ok(TimeMode::Timestamp),
            "range" => Ok(TimeMode::Range),
            other => Err(MosaicError::InvalidTimeMode(other.to_string())),
        }
    }
}

/// A mosaic whose index can be rebuilt.
///
/// `granules()` may be called more than once per rebuild and must yield the
/// same granules in the same order each time.
pub trait Mosaic {
    /// Base name for every index artifact.
    fn name(&self) -> &str;

    /// Directory holding the granules and the index artifacts.
    fn root_dir(&self) -> &Path;

    /// Time mode of the mosaic.
    fn time_mode(&self) -> TimeMode;

    /// Enumerate granules in a stable order.
    fn granules(&self) -> Box<dyn Iterator<Item = Granule> + '_>;
}

/// A mosaic over a granule list held in memory.
///
/// # Example
///
/// ```
/// use mosaic_index::granule::Granule;
/// use mosaic_index::mosaic::{InMemoryMosaic, Mosaic, TimeMode};
///
/// let mosaic = InMemoryMosaic::new("ortho", "/data/ortho")
///     .with_time_mode(TimeMode::Timestamp)
///     .with_granule(Granule::new("/data/ortho/a.tif"));
///
/// assert_eq!(mosaic.name(), "ortho");
/// assert_eq!(mosaic.granules().count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryMosaic {
    name: String,
    root_dir: PathBuf,
    time_mode: TimeMode,
    granules: Vec<Granule>,
}

impl InMemoryMosaic {
    /// Create an empty mosaic without time support.
    pub fn new(name: impl Into<String>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root_dir: root_dir.into(),
            time_mode: TimeMode::None,
            granules: Vec::new(),
        }
    }

    /// Set the time mode.
    pub fn with_time_mode(mut self, time_mode: TimeMode) -> Self {
        self.time_mode = time_mode;
        self
    }

    /// Append a granule.
    pub fn with_granule(mut self, granule: Granule) -> Self {
        self.granules.push(granule);
        self
    }

    /// Append several granules.
    pub fn with_granules(mut self, granules: impl IntoIterator<Item = Granule>) -> Self {
        self.granules.extend(granules);
        self
    }

    /// Number of granules.
    pub fn len(&self) -> usize {
        self.granules.len()
    }

    /// Whether the mosaic has no granules.
    pub fn is_empty(&self) -> bool {
        self.granules.is_empty()
    }
}

impl Mosaic for InMemoryMosaic {
    fn name(&self) -> &str {
        &self.name
    }

    fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn time_mode(&self) -> TimeMode {
        self.time_mode
    }

    fn granules(&self) -> Box<dyn Iterator<Item = Granule> + '_> {
        Box::new(self.granules.iter().cloned())
    }
}
