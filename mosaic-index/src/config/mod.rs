//! Configuration.
//!
//! [`IndexConfig`] tunes a single rebuild. [`ConfigFile`] is the user's INI
//! file (`~/.mosaic-index/config.ini`) from which front ends derive both the
//! rebuild settings and the directory discovery options.

mod file;

pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, LoggingSettings,
    MosaicSettings, DEFAULT_LOG_FILE,
};

/// Settings for one index rebuild.
///
/// # Example
///
/// ```
/// use mosaic_index::config::IndexConfig;
///
/// let config = IndexConfig::default().with_skip_null_envelopes(true);
/// assert!(config.skip_null_envelopes);
/// assert!(config.write_codepage);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Drop granules without an envelope instead of writing a footprint
    /// with null geometry.
    pub skip_null_envelopes: bool,
    /// Write a `.cpg` component declaring the attribute encoding.
    pub write_codepage: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            skip_null_envelopes: false,
            write_codepage: true,
        }
    }
}

impl IndexConfig {
    pub fn with_skip_null_envelopes(mut self, skip: bool) -> Self {
        self.skip_null_envelopes = skip;
        self
    }

    pub fn with_write_codepage(mut self, write: bool) -> Self {
        self.write_codepage = write;
        self
    }
}
