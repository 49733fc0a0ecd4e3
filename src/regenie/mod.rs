//! Building Regenie inputs and reading Regenie outputs.

pub mod masks;
pub mod output;
pub mod phenotype;
pub mod popmap;
