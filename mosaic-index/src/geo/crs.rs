//! Coordinate reference system identifiers.
//!
//! Granules carry their CRS as an opaque identifier: either an authority code
//! such as `EPSG:4326` or a raw WKT definition read from a `.prj` sidecar.
//! No reprojection happens anywhere in this crate; the identifier only needs
//! to be compared, displayed, and written out as WKT for the footprint
//! dataset's `.prj` component.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// WKT root keywords recognized when an identifier holds a full definition.
const WKT_ROOTS: &[&str] = &[
    "GEOGCS", "PROJCS", "GEOCCS", "COMPD_CS", "GEOGCRS", "PROJCRS", "GEODCRS", "COMPOUNDCRS",
];

/// A coordinate reference system identifier.
///
/// # Example
///
/// ```
/// use mosaic_index::geo::Crs;
///
/// let crs = Crs::new("epsg:4326");
/// assert_eq!(crs.epsg_code(), Some(4326));
/// assert_eq!(crs.identifier(), "EPSG:4326");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs {
    identifier: String,
}

impl Crs {
    /// Create a CRS from an identifier.
    ///
    /// Authority codes are canonicalized to `EPSG:<code>`; anything else is
    /// kept verbatim (trimmed).
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let trimmed = identifier.trim();
        match parse_epsg_identifier(trimmed) {
            Some(code) => Self::epsg(code),
            None => Self {
                identifier: trimmed.to_string(),
            },
        }
    }

    /// Create a CRS from an EPSG code.
    pub fn epsg(code: u16) -> Self {
        Self {
            identifier: format!("EPSG:{}", code),
        }
    }

    /// Create a CRS from a WKT definition.
    ///
    /// When the outermost node carries an EPSG authority the CRS collapses to
    /// that code; otherwise the WKT text itself becomes the identifier.
    /// Returns `None` for blank input.
    pub fn from_wkt(wkt: &str) -> Option<Self> {
        let wkt = wkt.trim();
        if wkt.is_empty() {
            return None;
        }

        match outermost_epsg_authority(wkt) {
            Some(code) => Some(Self::epsg(code)),
            None => Some(Self {
                identifier: wkt.to_string(),
            }),
        }
    }

    /// The identifier as given (canonicalized for EPSG codes).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// EPSG code, if this CRS is identified by one.
    pub fn epsg_code(&self) -> Option<u16> {
        parse_epsg_identifier(&self.identifier)
    }

    /// Whether the identifier is itself a WKT definition.
    pub fn is_wkt(&self) -> bool {
        let upper = self.identifier.to_ascii_uppercase();
        WKT_ROOTS
            .iter()
            .any(|root| upper.starts_with(root) && upper[root.len()..].trim_start().starts_with('['))
    }

    /// WKT definition suitable for a `.prj` file.
    ///
    /// EPSG codes are resolved through the bundled `crs-definitions`
    /// database. Returns `None` when the code is unknown or the identifier is
    /// neither a code nor WKT.
    pub fn to_wkt(&self) -> Option<String> {
        if let Some(code) = self.epsg_code() {
            return crs_definitions::from_code(code).map(|def| def.wkt.to_string());
        }
        if self.is_wkt() {
            return Some(self.identifier.clone());
        }
        None
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wkt() {
            // Full WKT is unreadable in log lines; show the root node name.
            let head: String = self.identifier.chars().take_while(|c| *c != ',').collect();
            write!(f, "{}]", head)
        } else {
            f.write_str(&self.identifier)
        }
    }
}

/// Parse `EPSG:4326`, `epsg:4326` or `urn:ogc:def:crs:EPSG::4326`.
fn parse_epsg_identifier(identifier: &str) -> Option<u16> {
    let upper = identifier.to_ascii_uppercase();
    let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
        rest
    } else if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:") {
        // Version segment is optional: EPSG::4326 or EPSG:9.6:4326
        rest.rsplit(':').next().unwrap_or(rest)
    } else {
        return None;
    };
    code.trim().parse().ok()
}

fn authority_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // AUTHORITY["EPSG","4326"] (WKT1) or ID["EPSG",4326] (WKT2)
        Regex::new(r#"(?i)(?:AUTHORITY|ID)\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#)
            .expect("authority pattern is valid")
    })
}

/// The root node's authority is written last, so the final match wins.
fn outermost_epsg_authority(wkt: &str) -> Option<u16> {
    let captures = authority_pattern().captures_iter(wkt).last()?;
    let code = captures.get(1)?.as_str();

    // Nested authorities (datum, spheroid, unit) also match; only accept the
    // last one if it closes the root node.
    let end = captures.get(0)?.end();
    let tail = wkt[end..].trim();
    if tail == "]" {
        code.parse().ok()
    } else {
        None
    }
}
