//! Geometry primitives: envelopes and CRS identifiers.

mod crs;
mod envelope;

pub use crs::Crs;
pub use envelope::Envelope;
