//! Error type of the annotation resolution and statistics core.

use thiserror::Error;

/// Errors raised while resolving annotations and computing cohort statistics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(
        "unexpected genotype {genotype} found for variant {variant_id}; \
        did you run bcftools norm on multi-allelic sites?"
    )]
    InvalidGenotype {
        variant_id: String,
        genotype: String,
    },
    #[error("field {field} is not declared in the {tag} header")]
    UndeclaredField { tag: String, field: String },
    #[error("no {tag} INFO header found")]
    MissingTag { tag: String },
    #[error("the description of the {tag} header does not contain a 'Format:' field list")]
    MissingFormat { tag: String },
    #[error("field index {idx} is out of range for transcript annotation with {len} fields")]
    FieldIndexOutOfRange { idx: usize, len: usize },
    #[error("annotation does not contain any transcript")]
    EmptyAnnotation,
    #[error("invalid allele count {value:?}")]
    InvalidCount { value: String },
}
