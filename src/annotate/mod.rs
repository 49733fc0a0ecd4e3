//! Resolution of VEP `CSQ` transcript annotations.

pub mod csq;
pub mod dbnsfp;
pub mod schema;
pub mod spliceai;
pub mod transcript;

/// Separator of transcripts in the `CSQ` value.
pub const TRANSCRIPT_SEP: char = ',';

/// Separator of sub fields within one transcript annotation.
pub const FIELD_SEP: char = '|';

/// Separator of multiple values within one sub field.
pub const MULTI_VALUE_SEP: char = '&';

/// Default name of the INFO tag carrying the VEP annotation.
pub const DEFAULT_CSQ_TAG: &str = "CSQ";
