//! Defines some common numerical routines used in this library.

/// Defines the golden-section line search.
pub mod line_search;

pub use line_search::golden_section;
