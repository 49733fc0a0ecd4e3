//! Filtering of jointly called cohort variants.

pub mod gatk;
