//! Footprint schema and records.

use chrono::{DateTime, Utc};

use crate::geo::{Crs, Envelope};
use crate::mosaic::TimeMode;

/// Geometry attribute name.
pub const GEOMETRY_ATTRIBUTE: &str = "the_geom";

/// Attribute holding the granule file name.
pub const LOCATION_ATTRIBUTE: &str = "location";

/// Attribute holding the granule acquisition time.
pub const TIME_ATTRIBUTE: &str = "time";

/// Value type of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Polygon,
    Text,
    Date,
}

/// One attribute of the footprint schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
}

/// Attribute layout of a footprint dataset.
///
/// Always `the_geom` (polygon) and `location` (text); `time` (date) is added
/// when the mosaic's time mode is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintSchema {
    name: String,
    crs: Crs,
    attributes: Vec<Attribute>,
}

impl FootprintSchema {
    /// Build the schema for a mosaic.
    pub fn new(name: impl Into<String>, crs: Crs, time_mode: TimeMode) -> Self {
        let mut attributes = vec![
            Attribute {
                name: GEOMETRY_ATTRIBUTE,
                kind: AttributeKind::Polygon,
            },
            Attribute {
                name: LOCATION_ATTRIBUTE,
                kind: AttributeKind::Text,
            },
        ];
        if time_mode.is_enabled() {
            attributes.push(Attribute {
                name: TIME_ATTRIBUTE,
                kind: AttributeKind::Date,
            });
        }

        Self {
            name: name.into(),
            crs,
            attributes,
        }
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference CRS of every geometry.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Whether the schema has a time attribute.
    pub fn has_time(&self) -> bool {
        self.attribute(TIME_ATTRIBUTE).is_some()
    }
}

/// One footprint per granule.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintRecord {
    /// Rectangular footprint; `None` when the granule had no envelope.
    pub geometry: Option<Envelope>,
    /// Granule file name.
    pub location: String,
    /// Acquisition time. Only written when the schema has a time attribute.
    pub time: Option<DateTime<Utc>>,
}
