//! Configuration file handling for ~/.mosaic-index/config.ini.
//!
//! ```ini
//! [mosaic]
//! name = ortho
//! time_mode = timestamp
//! default_crs = EPSG:4326
//! time_regex = (\d{8})
//! time_format = %Y%m%d
//! skip_null_envelopes = false
//!
//! [logging]
//! directory = ~/.mosaic-index/logs
//! file = mosaic-index.log
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use thiserror::Error;

use super::IndexConfig;
use crate::geo::Crs;
use crate::mosaic::{DiscoveryOptions, TimeMode, TimestampParser, DEFAULT_TIME_REGEX};

/// Default log file name inside the logging directory.
pub const DEFAULT_LOG_FILE: &str = "mosaic-index.log";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[mosaic]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MosaicSettings {
    pub name: Option<String>,
    pub time_mode: TimeMode,
    pub default_crs: Option<Crs>,
    pub time_regex: Option<String>,
    pub time_format: Option<String>,
    pub skip_null_envelopes: bool,
}

/// `[logging]` section. File logging is off unless a directory is set.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: Option<PathBuf>,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl LoggingSettings {
    /// Full path of the log file, when file logging is enabled.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| dir.join(&self.file))
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub mosaic: MosaicSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.mosaic-index/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        // Regex values carry backslashes that must reach the parser verbatim
        let options = ParseOption {
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_file_opt(path, options)?;
        parse_ini(&ini)
    }

    /// Rebuild settings derived from the file.
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::default().with_skip_null_envelopes(self.mosaic.skip_null_envelopes)
    }

    /// Discovery options derived from the file.
    ///
    /// The timestamp parser falls back to the default pattern, and to the
    /// default date and date-time formats, for whichever is not configured.
    pub fn discovery_options(&self) -> Result<DiscoveryOptions, ConfigFileError> {
        let settings = &self.mosaic;
        let regex = settings.time_regex.as_deref().unwrap_or(DEFAULT_TIME_REGEX);
        let parser = match settings.time_format.as_deref() {
            Some(format) => TimestampParser::new(regex, format),
            None => TimestampParser::with_default_formats(regex),
        }
        .map_err(|e| ConfigFileError::InvalidValue {
            section: "mosaic".to_string(),
            key: "time_regex".to_string(),
            value: regex.to_string(),
            reason: e.to_string(),
        })?;

        let mut options = DiscoveryOptions::default()
            .with_time_mode(settings.time_mode)
            .with_timestamp_parser(parser);
        if let Some(name) = &settings.name {
            options = options.with_name(name.clone());
        }
        if let Some(crs) = &settings.default_crs {
            options = options.with_default_crs(crs.clone());
        }
        Ok(options)
    }
}

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [mosaic] section
    if let Some(section) = ini.section(Some("mosaic")) {
        if let Some(v) = non_empty(section.get("name")) {
            config.mosaic.name = Some(v.to_string());
        }
        if let Some(v) = section.get("time_mode") {
            config.mosaic.time_mode = v.parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "mosaic".to_string(),
                key: "time_mode".to_string(),
                value: v.to_string(),
                reason: "must be one of: none, timestamp, range".to_string(),
            })?;
        }
        if let Some(v) = non_empty(section.get("default_crs")) {
            config.mosaic.default_crs = Some(Crs::new(v));
        }
        if let Some(v) = non_empty(section.get("time_regex")) {
            config.mosaic.time_regex = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("time_format")) {
            config.mosaic.time_format = Some(v.to_string());
        }
        if let Some(v) = section.get("skip_null_envelopes") {
            config.mosaic.skip_null_envelopes = parse_bool(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.logging.directory = Some(expand_tilde(v));
        }
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Get the path to the config directory (~/.mosaic-index).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mosaic-index")
}

/// Get the path to the config file (~/.mosaic-index/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mosaic::{DEFAULT_DATETIME_FORMAT, DEFAULT_TIME_FORMAT};
    use std::fs;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        fs::write(&path, content).unwrap();
        (temp, path)
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.logging.log_path(), None);
    }

    #[test]
    fn test_parses_mosaic_section() {
        let (_temp, path) = write_config(
            "[mosaic]\n\
             name = ortho\n\
             time_mode = Timestamp\n\
             default_crs = epsg:3857\n\
             time_format = %Y%m%dT%H%M%S\n\
             skip_null_envelopes = yes\n",
        );
        let config = ConfigFile::load_from(&path).unwrap();

        assert_eq!(config.mosaic.name.as_deref(), Some("ortho"));
        assert_eq!(config.mosaic.time_mode, TimeMode::Timestamp);
        assert_eq!(config.mosaic.default_crs, Some(Crs::epsg(3857)));
        assert_eq!(config.mosaic.time_format.as_deref(), Some("%Y%m%dT%H%M%S"));
        assert_eq!(config.mosaic.time_regex, None);
        assert!(config.index_config().skip_null_envelopes);
    }

    #[test]
    fn test_regex_backslashes_survive() {
        let (_temp, path) = write_config("[mosaic]\ntime_regex = _(\\d{8})\\.\n");
        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.mosaic.time_regex.as_deref(), Some(r"_(\d{8})\."));
    }

    #[test]
    fn test_invalid_time_mode() {
        let (_temp, path) = write_config("[mosaic]\ntime_mode = weekly\n");
        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "time_mode"));
    }

    #[test]
    fn test_logging_section() {
        let (_temp, path) = write_config("[logging]\ndirectory = /var/log/mosaic\n");
        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(
            config.logging.log_path(),
            Some(PathBuf::from("/var/log/mosaic").join(DEFAULT_LOG_FILE))
        );
    }

    #[test]
    fn test_discovery_options_from_file() {
        let config = ConfigFile {
            mosaic: MosaicSettings {
                name: Some("ortho".to_string()),
                time_mode: TimeMode::Range,
                default_crs: Some(Crs::epsg(4326)),
                ..Default::default()
            },
            ..Default::default()
        };
        let options = config.discovery_options().unwrap();
        assert_eq!(options.name.as_deref(), Some("ortho"));
        assert_eq!(options.time_mode, TimeMode::Range);
        assert_eq!(options.default_crs, Some(Crs::epsg(4326)));
        let parser = options.timestamp_parser.unwrap();
        assert_eq!(parser.pattern(), DEFAULT_TIME_REGEX);
        assert_eq!(
            parser.formats().to_vec(),
            vec![DEFAULT_DATETIME_FORMAT, DEFAULT_TIME_FORMAT]
        );
    }

    #[test]
    fn test_configured_time_format_replaces_defaults() {
        let config = ConfigFile {
            mosaic: MosaicSettings {
                time_format: Some("%Y-%m-%d".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let parser = config.discovery_options().unwrap().timestamp_parser.unwrap();
        assert_eq!(parser.formats().to_vec(), vec!["%Y-%m-%d"]);
    }

    #[test]
    fn test_bad_time_regex() {
        let config = ConfigFile {
            mosaic: MosaicSettings {
                time_regex: Some("(unclosed".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.discovery_options().unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "time_regex"));
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("on"));
        assert!(parse_bool(" 1 "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("nope"));
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/tmp/logs"), PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with(".mosaic-index/config.ini"));
    }
}
