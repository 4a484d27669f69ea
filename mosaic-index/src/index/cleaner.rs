//! Removal of stale index artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::mosaic::Mosaic;
use crate::shapefile::COMPONENT_EXTENSIONS;

/// Extension of the descriptor file.
pub const DESCRIPTOR_EXTENSION: &str = "properties";

/// File left behind by mosaic readers; always removed on rebuild.
pub const SAMPLE_IMAGE: &str = "sample_image";

/// Errors raised while removing artifacts.
#[derive(Debug, Error)]
pub enum CleanError {
    /// The mosaic directory could not be listed.
    #[error("failed to list {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A matching artifact could not be deleted.
    #[error("failed to delete {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Whether `file_name` is an index artifact of the mosaic `name`.
///
/// Matches `<name>.<ext>` case-insensitively for the descriptor and every
/// shapefile component extension, plus `sample_image` regardless of name.
///
/// # Example
///
/// ```
/// use mosaic_index::index::is_artifact;
///
/// assert!(is_artifact("ortho", "ORTHO.shp"));
/// assert!(is_artifact("ortho", "ortho.properties"));
/// assert!(is_artifact("ortho", "Sample_Image"));
/// assert!(!is_artifact("ortho", "ortho.tif"));
/// assert!(!is_artifact("ortho", "other.shp"));
/// ```
pub fn is_artifact(name: &str, file_name: &str) -> bool {
    let file_name = file_name.to_lowercase();
    if file_name == SAMPLE_IMAGE {
        return true;
    }

    let prefix = format!("{}.", name.to_lowercase());
    let Some(ext) = file_name.strip_prefix(&prefix) else {
        return false;
    };
    ext == DESCRIPTOR_EXTENSION || COMPONENT_EXTENSIONS.contains(&ext)
}

/// Remove every artifact of `mosaic` from its root directory.
///
/// Returns the removed paths in directory order. Zero matches is not an
/// error. The first failed deletion aborts the scan; files removed before it
/// stay removed.
pub fn clean(mosaic: &dyn Mosaic) -> Result<Vec<PathBuf>, CleanError> {
    clean_dir(mosaic.root_dir(), mosaic.name())
}

/// [`clean`] for a bare directory and mosaic name.
pub fn clean_dir(root_dir: &Path, name: &str) -> Result<Vec<PathBuf>, CleanError> {
    let list_err = |source| CleanError::List {
        path: root_dir.to_path_buf(),
        source,
    };

    let mut removed = Vec::new();
    for entry in fs::read_dir(root_dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let file_name = entry.file_name();
        if !is_artifact(name, &file_name.to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        fs::remove_file(&path).map_err(|source| CleanError::Delete {
            path: path.clone(),
            source,
        })?;
        debug!(artifact = %path.display(), "Removed index artifact");
        removed.push(path);
    }

    Ok(removed)
}
