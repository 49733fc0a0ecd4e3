//! Variant level results of the cohort.

pub mod details;
pub mod results;
pub mod source;
