//! Acquisition time extraction from granule file names.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use super::MosaicError;

/// Default pattern: an 8-digit date, optionally followed by `T` and a
/// 6-digit time, e.g. `ortho_20240501.tif` or `ortho_20240501T093000.tif`.
pub const DEFAULT_TIME_REGEX: &str = r"(\d{8}(?:T\d{6})?)";

/// Default format matching [`DEFAULT_TIME_REGEX`]'s date-only form.
pub const DEFAULT_TIME_FORMAT: &str = "%Y%m%d";

/// Default format matching [`DEFAULT_TIME_REGEX`]'s `T`-suffixed form.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Extracts timestamps from file names.
///
/// The first capture group of the regex (or the whole match when the regex
/// has no groups) is parsed with one or more `chrono` format strings, tried
/// in order. Formats without a time component resolve to midnight UTC.
///
/// The default parser accepts both [`DEFAULT_DATETIME_FORMAT`] and
/// [`DEFAULT_TIME_FORMAT`].
///
/// # Example
///
/// ```
/// use mosaic_index::mosaic::TimestampParser;
///
/// let parser = TimestampParser::new(r"_(\d{8})\.", "%Y%m%d").unwrap();
/// let ts = parser.parse("ortho_20240501.tif").unwrap();
/// assert_eq!(ts.to_rfc3339(), "2024-05-01T00:00:00+00:00");
/// ```
#[derive(Debug, Clone)]
pub struct TimestampParser {
    pattern: Regex,
    formats: Vec<String>,
}

impl TimestampParser {
    /// Create a parser from a regex and a `chrono` format string.
    pub fn new(pattern: &str, format: impl Into<String>) -> Result<Self, MosaicError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            formats: vec![format.into()],
        })
    }

    /// Create a parser from a regex and the default date and date-time
    /// formats.
    pub fn with_default_formats(pattern: &str) -> Result<Self, MosaicError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            formats: default_formats(),
        })
    }

    /// The regex used to locate the timestamp.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The `chrono` format strings, in the order they are tried.
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// Extract a timestamp from a file name, if one matches.
    pub fn parse(&self, file_name: &str) -> Option<DateTime<Utc>> {
        let captures = self.pattern.captures(file_name)?;
        let text = captures.get(1).or_else(|| captures.get(0))?.as_str();

        self.formats
            .iter()
            .find_map(|format| parse_with(text, format))
    }
}

fn parse_with(text: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
        return Some(Utc.from_utc_datetime(&datetime));
    }

    // Date-only formats fail NaiveDateTime parsing
    let date = NaiveDate::parse_from_str(text, format).ok()?;
    date.and_hms_opt(0, 0, 0)
        .map(|datetime| Utc.from_utc_datetime(&datetime))
}

fn default_formats() -> Vec<String> {
    vec![
        DEFAULT_DATETIME_FORMAT.to_string(),
        DEFAULT_TIME_FORMAT.to_string(),
    ]
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_TIME_REGEX).expect("default time pattern is valid"),
            formats: default_formats(),
        }
    }
}
