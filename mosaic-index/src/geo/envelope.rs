//! Axis-aligned envelopes in map units.

use std::fmt;

/// Axis-aligned bounding rectangle expressed in the units of its CRS.
///
/// Constructors normalize the corners so that `min_* <= max_*` always holds.
///
/// # Example
///
/// ```
/// use mosaic_index::geo::Envelope;
///
/// let mut total = Envelope::new(0.0, 0.0, 1.0, 1.0);
/// total.include(&Envelope::new(1.0, 0.0, 2.0, 1.0));
///
/// assert_eq!(total, Envelope::new(0.0, 0.0, 2.0, 1.0));
/// assert_eq!(total.width(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Western edge.
    pub min_x: f64,
    /// Southern edge.
    pub min_y: f64,
    /// Eastern edge.
    pub max_x: f64,
    /// Northern edge.
    pub max_y: f64,
}

impl Envelope {
    /// Create an envelope from two opposite corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// Extent along the x axis.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along the y axis.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grow this envelope so that it also covers `other`.
    pub fn include(&mut self, other: &Envelope) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Smallest envelope covering both `self` and `other`.
    pub fn union(&self, other: &Envelope) -> Envelope {
        let mut merged = *self;
        merged.include(other);
        merged
    }

    /// Whether `other` lies entirely inside this envelope (edges included).
    pub fn contains(&self, other: &Envelope) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    /// Closed outer ring of the rectangle, clockwise from the south-west corner.
    ///
    /// Shapefile polygons treat clockwise rings as outer boundaries.
    pub fn ring(&self) -> [(f64, f64); 5] {
        [
            (self.min_x, self.min_y),
            (self.min_x, self.max_y),
            (self.max_x, self.max_y),
            (self.max_x, self.min_y),
            (self.min_x, self.min_y),
        ]
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
