//! Allele counting over the genotypes of a cohort partition.

use super::value::{round_to_significant_digits, ReportValue};
use crate::error::Error;

/// Genotypes accepted for bi-allelic sites.
pub const VALID_GENOTYPES: &[&str] = &[
    "./.", "0/0", "1/0", "0/1", "1/1", "0|0", "1|0", "0|1", "1|1",
];

/// Genotype of a sample without a call.
pub const NO_CALL: &str = "./.";

/// Genotypes that do not carry the alternate allele.
const NON_CARRIER_GENOTYPES: &[&str] = &[NO_CALL, "0/0", "0|0"];

/// Significant digits of reported frequencies and p-values.
pub const SIGNIFICANT_DIGITS: i32 = 3;

/// Alternate allele count and total allele number of a set of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlleleSummary {
    pub ac: u64,
    pub an: u64,
}

impl AlleleSummary {
    /// Number of samples with a call.
    pub fn n(&self) -> u64 {
        self.an / 2
    }

    /// Number of reference alleles.
    pub fn ref_count(&self) -> u64 {
        self.an - self.ac
    }

    /// Alternate allele frequency, integer `0` without alternate alleles.
    pub fn af(&self) -> ReportValue {
        if self.ac == 0 {
            ReportValue::Int(0)
        } else {
            ReportValue::Float(round_to_significant_digits(
                self.ac as f64 / self.an as f64,
                SIGNIFICANT_DIGITS,
            ))
        }
    }
}

/// Count alleles over the given genotypes of one variant.
///
/// Every called sample adds two alleles, the alternate alleles are the `1`s of the genotype.
pub fn summarize_genotypes<'a, I>(genotypes: I, variant_id: &str) -> Result<AlleleSummary, Error>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut summary = AlleleSummary::default();
    for gt in genotypes {
        if !VALID_GENOTYPES.contains(&gt) {
            return Err(Error::InvalidGenotype {
                variant_id: variant_id.to_string(),
                genotype: gt.to_string(),
            });
        }
        if gt == NO_CALL {
            continue;
        }
        summary.an += 2;
        summary.ac += gt.matches('1').count() as u64;
    }
    Ok(summary)
}

/// Whether the genotype is a valid call carrying the alternate allele.
pub fn is_carrier(gt: &str) -> bool {
    VALID_GENOTYPES.contains(&gt) && !NON_CARRIER_GENOTYPES.contains(&gt)
}
