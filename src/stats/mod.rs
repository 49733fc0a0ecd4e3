//! Case-control statistics of cohort variants.

pub mod fisher;
pub mod genotypes;
pub mod value;
