//! Mosaic descriptor (`<name>.properties`).
//!
//! The descriptor tells mosaic readers how to interpret the footprint
//! dataset: its name, the native resolution of the single pyramid level,
//! and which attributes carry the granule location and time.
//!
//! Keys are written in a fixed order with no timestamp comment, so rebuilding
//! an unchanged mosaic produces a byte-identical file.
//!
//! Readers decode the file as ISO-8859-1 properties, so values are written
//! in ASCII with `\uXXXX` escapes for anything else.

use std::io;
use std::path::{Path, PathBuf};

use ini::{EscapePolicy, Ini, LineSeparator, ParseOption, WriteOption};
use thiserror::Error;

use super::schema::{LOCATION_ATTRIBUTE, TIME_ATTRIBUTE};
use crate::geo::Envelope;
use crate::granule::PixelSize;

/// Descriptor keys.
pub mod keys {
    pub const NAME: &str = "Name";
    pub const LEVELS: &str = "Levels";
    pub const LEVELS_NUM: &str = "LevelsNum";
    pub const LOCATION_ATTRIBUTE: &str = "LocationAttribute";
    pub const TIME_ATTRIBUTE: &str = "TimeAttribute";
}

/// Errors raised while writing or reading a descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("descriptor {} has no {key} entry", path.display())]
    MissingKey { path: PathBuf, key: &'static str },

    #[error("descriptor {} has invalid {key} value '{value}'", path.display())]
    InvalidValue {
        path: PathBuf,
        key: &'static str,
        value: String,
    },
}

/// Contents of a mosaic descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicDescriptor {
    pub name: String,
    /// Ground units per pixel along x.
    pub resolution_x: f64,
    /// Ground units per pixel along y.
    pub resolution_y: f64,
    /// Number of pyramid levels; always 1 for a flat mosaic.
    pub level_count: u32,
    pub location_attribute: String,
    /// Set only when the mosaic is time-indexed.
    pub time_attribute: Option<String>,
}

impl MosaicDescriptor {
    /// Derive a descriptor from the reference granule's geometry.
    ///
    /// Returns `None` when the pixel size is empty, as no resolution can be
    /// derived from it.
    pub fn from_reference(
        name: &str,
        envelope: &Envelope,
        pixel_size: PixelSize,
        time_enabled: bool,
    ) -> Option<Self> {
        if pixel_size.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            resolution_x: envelope.width() / f64::from(pixel_size.width),
            resolution_y: envelope.height() / f64::from(pixel_size.height),
            level_count: 1,
            location_attribute: LOCATION_ATTRIBUTE.to_string(),
            time_attribute: time_enabled.then(|| TIME_ATTRIBUTE.to_string()),
        })
    }

    /// The `Levels` value: `<res_x>,<res_y>` with six decimals.
    pub fn levels_value(&self) -> String {
        format!("{:.6},{:.6}", self.resolution_x, self.resolution_y)
    }

    fn to_ini(&self) -> Ini {
        let mut entries = vec![
            (keys::NAME, self.name.clone()),
            (keys::LEVELS, self.levels_value()),
            (keys::LEVELS_NUM, self.level_count.to_string()),
            (keys::LOCATION_ATTRIBUTE, self.location_attribute.clone()),
        ];
        if let Some(time) = &self.time_attribute {
            entries.push((keys::TIME_ATTRIBUTE, time.clone()));
        }

        let mut ini = Ini::new();
        for (key, value) in entries {
            ini.set_to(None::<String>, key.to_string(), escape_value(&value));
        }
        ini
    }

    /// Write the descriptor to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), DescriptorError> {
        let options = WriteOption {
            escape_policy: EscapePolicy::Nothing,
            line_separator: LineSeparator::CR,
            ..Default::default()
        };
        self.to_ini()
            .write_to_file_opt(path, options)
            .map_err(|source| DescriptorError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Load a descriptor previously written by [`write_to`].
    ///
    /// `Levels` values keep only the six written decimals.
    ///
    /// [`write_to`]: MosaicDescriptor::write_to
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let options = ParseOption {
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_file_opt(path, options).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let props = ini.general_section();

        let required = |key: &'static str| {
            props.get(key).ok_or_else(|| DescriptorError::MissingKey {
                path: path.to_path_buf(),
                key,
            })
        };
        let invalid = |key: &'static str, value: &str| DescriptorError::InvalidValue {
            path: path.to_path_buf(),
            key,
            value: value.to_string(),
        };
        let text = |key: &'static str, value: &str| {
            unescape_value(value).ok_or_else(|| invalid(key, value))
        };

        let levels = required(keys::LEVELS)?;
        let (resolution_x, resolution_y) = levels
            .split_once(',')
            .and_then(|(x, y)| Some((x.trim().parse().ok()?, y.trim().parse().ok()?)))
            .ok_or_else(|| invalid(keys::LEVELS, levels))?;

        let levels_num = required(keys::LEVELS_NUM)?;
        let level_count = levels_num
            .trim()
            .parse()
            .map_err(|_| invalid(keys::LEVELS_NUM, levels_num))?;

        let time_attribute = match props.get(keys::TIME_ATTRIBUTE) {
            Some(value) => Some(text(keys::TIME_ATTRIBUTE, value)?),
            None => None,
        };

        Ok(Self {
            name: text(keys::NAME, required(keys::NAME)?)?,
            resolution_x,
            resolution_y,
            level_count,
            location_attribute: text(
                keys::LOCATION_ATTRIBUTE,
                required(keys::LOCATION_ATTRIBUTE)?,
            )?,
            time_attribute,
        })
    }
}

/// Escape a value for an ISO-8859-1 properties reader.
///
/// Printable ASCII passes through except `\`. Everything else becomes one
/// `\uXXXX` escape per UTF-16 code unit.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ' '..='~' => escaped.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    escaped.push_str(&format!("\\u{:04X}", unit));
                }
            }
        }
    }
    escaped
}

/// Reverse [`escape_value`]. Returns `None` on a malformed `\u` escape or an
/// unpaired surrogate.
fn unescape_value(value: &str) -> Option<String> {
    let mut units = Vec::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        match chars.next()? {
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return None;
                }
                units.push(u16::from_str_radix(&hex, 16).ok()?);
            }
            other => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(other.encode_utf16(&mut buf));
            }
        }
    }
    String::from_utf16(&units).ok()
}
