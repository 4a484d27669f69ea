//! Directory-backed mosaics.
//!
//! Granules are image files in the mosaic directory. Georeferencing comes
//! from sidecar files next to each image:
//!
//! - a world file (`.tfw`, `.pgw`, `.jgw`, `.wld`, ...) for the envelope
//! - a `.prj` file for the CRS, falling back to a configured default. A
//!   `.prj` that belongs to the mosaic's own footprint dataset is ignored.
//!
//! Pixel dimensions are read from the image header. Discovery happens once in
//! [`DirectoryMosaic::open`]; the granule list is then replayed on every call
//! to [`Mosaic::granules`].

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use tracing::{debug, warn};

use super::world_file::{sidecar_candidates, WorldFile};
use super::{Mosaic, MosaicError, TimeMode, TimestampParser};
use crate::geo::{Crs, Envelope};
use crate::granule::{Granule, PixelSize};
use crate::index::is_artifact;

/// Image extensions treated as granules.
pub const IMAGE_EXTENSIONS: &[&str] = &["tif", "tiff", "png", "jpg", "jpeg"];

/// Options controlling granule discovery.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Mosaic name. Defaults to the directory name.
    pub name: Option<String>,

    /// Time mode of the mosaic.
    pub time_mode: TimeMode,

    /// CRS for granules without a `.prj` sidecar.
    pub default_crs: Option<Crs>,

    /// File-name timestamp extraction. Only consulted when the time mode is
    /// enabled.
    pub timestamp_parser: Option<TimestampParser>,
}

impl DiscoveryOptions {
    /// Set the mosaic name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the time mode.
    pub fn with_time_mode(mut self, time_mode: TimeMode) -> Self {
        self.time_mode = time_mode;
        self
    }

    /// Set the fallback CRS.
    pub fn with_default_crs(mut self, crs: Crs) -> Self {
        self.default_crs = Some(crs);
        self
    }

    /// Set the timestamp parser.
    pub fn with_timestamp_parser(mut self, parser: TimestampParser) -> Self {
        self.timestamp_parser = Some(parser);
        self
    }
}

/// A mosaic discovered from the image files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryMosaic {
    name: String,
    root_dir: PathBuf,
    time_mode: TimeMode,
    granules: Vec<Granule>,
}

impl DirectoryMosaic {
    /// Scan `root_dir` for granules.
    ///
    /// Images are enumerated in file-name order. Missing or unusable sidecars
    /// are logged and leave the corresponding granule attribute unset; they
    /// never fail the scan.
    pub fn open(
        root_dir: impl Into<PathBuf>,
        options: &DiscoveryOptions,
    ) -> Result<Self, MosaicError> {
        let root_dir = root_dir.into();
        if !root_dir.is_dir() {
            return Err(MosaicError::DirectoryNotFound(root_dir));
        }

        let name = match &options.name {
            Some(name) => name.clone(),
            None => default_name(&root_dir)?,
        };
        validate_name(&name)?;

        let images = find_images(&root_dir)?;
        debug!(
            mosaic = %name,
            dir = %root_dir.display(),
            count = images.len(),
            "Discovered granule images"
        );

        let granules = images
            .iter()
            .map(|path| describe_granule(path, &name, options))
            .collect();

        Ok(Self {
            name,
            root_dir,
            time_mode: options.time_mode,
            granules,
        })
    }

    /// Number of discovered granules.
    pub fn len(&self) -> usize {
        self.granules.len()
    }

    /// Whether no granules were discovered.
    pub fn is_empty(&self) -> bool {
        self.granules.is_empty()
    }
}

impl Mosaic for DirectoryMosaic {
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

/// The directory's own name, used when no mosaic name is configured.
fn default_name(root_dir: &Path) -> Result<String, MosaicError> {
    let canonical = fs::canonicalize(root_dir).map_err(|source| MosaicError::Io {
        path: root_dir.to_path_buf(),
        source,
    })?;
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MosaicError::InvalidName(canonical.display().to_string()))
}

/// Mosaic names become artifact base names and must stay inside the directory.
pub(crate) fn validate_name(name: &str) -> Result<(), MosaicError> {
    let bad = name.trim().is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == "..";
    if bad {
        Err(MosaicError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

fn find_images(root_dir: &Path) -> Result<BTreeSet<PathBuf>, MosaicError> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let base = glob::Pattern::escape(&root_dir.to_string_lossy());

    let mut images = BTreeSet::new();
    for ext in IMAGE_EXTENSIONS {
        let pattern = format!("{}/*.{}", base, ext);
        for entry in glob::glob_with(&pattern, options)? {
            match entry {
                Ok(path) if path.is_file() => {
                    images.insert(path);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Skipping unreadable directory entry"),
            }
        }
    }
    Ok(images)
}

fn describe_granule(path: &Path, name: &str, options: &DiscoveryOptions) -> Granule {
    let mut granule = Granule::new(path);

    let pixel_size = match image::image_dimensions(path) {
        Ok((width, height)) => Some(PixelSize::new(width, height)),
        Err(e) => {
            warn!(granule = %path.display(), error = %e, "Unable to read image dimensions");
            None
        }
    };
    if let Some(pixel_size) = pixel_size {
        granule = granule.with_pixel_size(pixel_size);
    }

    if let Some(envelope) = pixel_size.and_then(|size| read_envelope(path, size)) {
        granule = granule.with_envelope(envelope);
    }

    if let Some(crs) = read_crs(path, name).or_else(|| options.default_crs.clone()) {
        granule = granule.with_crs(crs);
    }

    if options.time_mode.is_enabled() {
        let file_name = granule.location();
        let timestamp = options
            .timestamp_parser
            .as_ref()
            .and_then(|parser| parser.parse(&file_name));
        match timestamp {
            Some(ts) => granule = granule.with_timestamp(ts),
            None => debug!(granule = %file_name, "No timestamp in file name"),
        }
    }

    granule
}

fn read_envelope(image: &Path, pixel_size: PixelSize) -> Option<Envelope> {
    let Some(world_path) = sidecar_candidates(image).into_iter().find(|p| p.is_file()) else {
        debug!(granule = %image.display(), "No world file");
        return None;
    };

    let world = match WorldFile::load(&world_path) {
        Ok(world) => world,
        Err(e) => {
            warn!(error = %e, "Ignoring world file");
            return None;
        }
    };

    let envelope = world.envelope(pixel_size);
    if envelope.is_none() {
        warn!(
            world_file = %world_path.display(),
            "Rotated or degenerate world file, granule has no envelope"
        );
    }
    envelope
}

fn read_crs(image: &Path, name: &str) -> Option<Crs> {
    let prj = ["prj", "PRJ"]
        .iter()
        .map(|ext| image.with_extension(ext))
        .find(|p| p.is_file())?;

    // Left over from the previous rebuild; cleaned before the new one
    let file_name = prj.file_name()?.to_string_lossy();
    if is_artifact(name, &file_name) {
        debug!(prj = %prj.display(), "Ignoring projection file of the index itself");
        return None;
    }

    match fs::read_to_string(&prj) {
        Ok(wkt) => Crs::from_wkt(&wkt),
        Err(e) => {
            warn!(prj = %prj.display(), error = %e, "Unable to read projection file");
            None
        }
    }
}
