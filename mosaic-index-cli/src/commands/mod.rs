//! CLI command implementations.

pub mod clean;
pub mod common;
pub mod inspect;
pub mod rebuild;
