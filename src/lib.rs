//! cohortvar library main entry point.

pub mod annotate;
pub mod common;
pub mod error;
pub mod filter;
pub mod higlass;
pub mod regenie;
pub mod samples;
pub mod stats;
pub mod variants;

pub use error::Error;
