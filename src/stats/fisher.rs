//! One-sided Fisher's exact test of a case cohort against a comparison group.

use statrs::function::factorial::ln_binomial;

use super::genotypes::{AlleleSummary, SIGNIFICANT_DIGITS};
use super::value::{round_decimals, round_to_significant_digits, ReportValue};
use crate::annotate::MULTI_VALUE_SEP;
use crate::error::Error;

/// Decimal places of reported odds ratios and -log10(p) values.
pub const ROUND_DIGITS: i32 = 4;

/// Unrounded outcome of a one-sided ("greater") Fisher's exact test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FisherExact {
    pub odds_ratio: f64,
    /// p-value, capped at 1.
    pub p_value: f64,
    /// Natural logarithm of the p-value, finite even when `p_value` underflows.
    pub ln_p_value: f64,
}

/// Fisher's exact test of the 2x2 table `[[a, b], [c, d]]` with the alternative that the
/// odds ratio is greater than one.
///
/// The p-value is `P(X >= a)` with `X` hypergeometric over the table margins, summed in
/// log space.
pub fn fisher_exact_greater(a: u64, b: u64, c: u64, d: u64) -> FisherExact {
    let row = a + b;
    let col = a + c;
    let total = a + b + c + d;

    if row == 0 || col == 0 || c + d == 0 || b + d == 0 {
        return FisherExact {
            odds_ratio: f64::NAN,
            p_value: 1.0,
            ln_p_value: 0.0,
        };
    }

    let odds_ratio = if b > 0 && c > 0 {
        (a as u128 * d as u128) as f64 / (b as u128 * c as u128) as f64
    } else {
        f64::INFINITY
    };

    let lower = row.saturating_sub(total - col);
    let upper = row.min(col);
    if a <= lower {
        return FisherExact {
            odds_ratio,
            p_value: 1.0,
            ln_p_value: 0.0,
        };
    }

    let ln_denom = ln_binomial(total, row);
    let ln_pmf = |x: u64| ln_binomial(col, x) + ln_binomial(total - col, row - x) - ln_denom;
    let terms = (a..=upper).map(ln_pmf).collect::<Vec<_>>();
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ln_p_value = (max + terms.iter().map(|t| (t - max).exp()).sum::<f64>().ln()).min(0.0);

    FisherExact {
        odds_ratio,
        p_value: ln_p_value.exp().min(1.0),
        ln_p_value,
    }
}

/// Reported outcome of a test, all three values `NA` if no test could be run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FisherResult {
    pub p_value: ReportValue,
    pub odds_ratio: ReportValue,
    pub minus_log10_p: ReportValue,
}

impl FisherResult {
    pub fn na() -> Self {
        Self::default()
    }

    /// Run the test on `[[case_alt, case_ref], [comp_alt, comp_ref]]` and round the results.
    pub fn from_table(case_alt: u64, case_ref: u64, comp_alt: u64, comp_ref: u64) -> Self {
        let test = fisher_exact_greater(case_alt, case_ref, comp_alt, comp_ref);

        let p_value = match round_to_significant_digits(test.p_value, SIGNIFICANT_DIGITS) {
            p if p == 0.0 => ReportValue::Int(0),
            p => ReportValue::Float(p),
        };
        let minus_log10_p = if test.p_value == 1.0 {
            ReportValue::Int(0)
        } else {
            let value = if test.p_value > 0.0 {
                -test.p_value.log10()
            } else {
                -test.ln_p_value / std::f64::consts::LN_10
            };
            ReportValue::Float(round_decimals(value, ROUND_DIGITS))
        };

        Self {
            p_value,
            odds_ratio: ReportValue::Float(round_decimals(test.odds_ratio, ROUND_DIGITS)),
            minus_log10_p,
        }
    }
}

/// Test the cases against the controls of the cohort.
pub fn fisher_vs_cohort(case: &AlleleSummary, control: &AlleleSummary) -> FisherResult {
    FisherResult::from_table(case.ac, case.ref_count(), control.ac, control.ref_count())
}

/// Test the cases against a reference population given by its `AC` and `AN` annotation.
///
/// Empty values give `NA`.  `&`-separated lists are reduced to the entry with the lowest
/// allele frequency, lists of different length or with an `AN` of zero give `NA`.
pub fn fisher_vs_reference(
    case: &AlleleSummary,
    ref_ac: &str,
    ref_an: &str,
) -> Result<FisherResult, Error> {
    if ref_ac.is_empty() || ref_an.is_empty() {
        return Ok(FisherResult::na());
    }

    let (alt, an) = if !ref_ac.contains(MULTI_VALUE_SEP) && !ref_an.contains(MULTI_VALUE_SEP) {
        (parse_count(ref_ac)?, parse_count(ref_an)?)
    } else {
        let acs = parse_counts(ref_ac)?;
        let ans = parse_counts(ref_an)?;
        if acs.len() != ans.len() || ans.contains(&0) {
            return Ok(FisherResult::na());
        }
        let mut rarest = 0;
        for i in 1..acs.len() {
            if (acs[i] as f64 / ans[i] as f64) < (acs[rarest] as f64 / ans[rarest] as f64) {
                rarest = i;
            }
        }
        (acs[rarest], ans[rarest])
    };

    let reference = an.checked_sub(alt).ok_or_else(|| Error::InvalidCount {
        value: format!("AC={} AN={}", ref_ac, ref_an),
    })?;
    Ok(FisherResult::from_table(
        case.ac,
        case.ref_count(),
        alt,
        reference,
    ))
}

fn parse_count(value: &str) -> Result<u64, Error> {
    value.trim().parse().map_err(|_| Error::InvalidCount {
        value: value.to_string(),
    })
}

fn parse_counts(value: &str) -> Result<Vec<u64>, Error> {
    value.split(MULTI_VALUE_SEP).map(parse_count).collect()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const CASE: AlleleSummary = AlleleSummary { ac: 2, an: 10 };

    fn as_strings(result: &FisherResult) -> (String, String, String) {
        (
            result.p_value.to_string(),
            result.odds_ratio.to_string(),
            result.minus_log10_p.to_string(),
        )
    }

    #[test]
    fn fisher_exact_greater_small_table() {
        let test = fisher_exact_greater(2, 8, 0, 10);

        assert!((test.p_value - 43758.0 / 184756.0).abs() < 1e-12);
        assert_eq!(test.odds_ratio, f64::INFINITY);
    }

    #[test]
    fn fisher_exact_greater_matches_direct_sum() {
        // [[3, 1], [1, 3]]: P(X >= 3) = (16 + 1) / 70
        let test = fisher_exact_greater(3, 1, 1, 3);

        assert!((test.p_value - 17.0 / 70.0).abs() < 1e-12);
        assert_eq!(test.odds_ratio, 9.0);
    }

    #[test]
    fn fisher_exact_greater_lower_tail_is_one() {
        let test = fisher_exact_greater(0, 10, 5, 5);

        assert_eq!(test.p_value, 1.0);
        assert_eq!(test.odds_ratio, 0.0);
    }

    #[test]
    fn fisher_exact_greater_degenerate() {
        let test = fisher_exact_greater(0, 10, 0, 10);

        assert_eq!(test.p_value, 1.0);
        assert!(test.odds_ratio.is_nan());
    }

    #[test]
    fn fisher_exact_greater_underflow() {
        let test = fisher_exact_greater(5000, 0, 0, 100_000_000);

        assert_eq!(test.p_value, 0.0);
        assert!(test.ln_p_value.is_finite());
        assert!(test.ln_p_value < -745.0);
    }

    #[test]
    fn result_case_vs_no_carriers() {
        let result = FisherResult::from_table(2, 8, 0, 10);

        assert_eq!(
            as_strings(&result),
            (
                String::from("0.237"),
                String::from("inf"),
                String::from("0.6255")
            )
        );
    }

    #[test]
    fn result_no_alternate_alleles() {
        let result = FisherResult::from_table(0, 10, 0, 10);

        assert_eq!(result.minus_log10_p, ReportValue::Int(0));
        assert_eq!(
            as_strings(&result),
            (String::from("1.0"), String::from("nan"), String::from("0"))
        );
    }

    #[test]
    fn result_underflow_is_zero() {
        let result = FisherResult::from_table(5000, 0, 0, 100_000_000);

        assert_eq!(result.p_value, ReportValue::Int(0));
        assert!(result.minus_log10_p.as_f64().unwrap_or_default() > 323.0);
    }

    #[test]
    fn vs_cohort() {
        let control = AlleleSummary { ac: 0, an: 10 };
        assert_eq!(
            fisher_vs_cohort(&CASE, &control),
            FisherResult::from_table(2, 8, 0, 10)
        );
    }

    #[rstest::rstest]
    #[case::empty_ac("", "100")]
    #[case::empty_an("5", "")]
    #[case::length_mismatch("5&1", "100")]
    #[case::zero_an("5&1", "0&50")]
    fn vs_reference_na(#[case] ac: &str, #[case] an: &str) -> Result<(), anyhow::Error> {
        assert_eq!(fisher_vs_reference(&CASE, ac, an)?, FisherResult::na());

        Ok(())
    }

    #[test]
    fn vs_reference_single() -> Result<(), anyhow::Error> {
        assert_eq!(
            fisher_vs_reference(&CASE, "5", "100")?,
            FisherResult::from_table(2, 8, 5, 95)
        );

        Ok(())
    }

    #[test]
    fn vs_reference_selects_rarest() -> Result<(), anyhow::Error> {
        assert_eq!(
            fisher_vs_reference(&CASE, "5&1", "100&50")?,
            FisherResult::from_table(2, 8, 1, 49)
        );
        // ties keep the first entry
        assert_eq!(
            fisher_vs_reference(&CASE, "2&1", "100&50")?,
            FisherResult::from_table(2, 8, 2, 98)
        );

        Ok(())
    }

    #[rstest::rstest]
    #[case("x", "100")]
    #[case("5&x", "100&50")]
    #[case("101", "100")]
    fn vs_reference_invalid(#[case] ac: &str, #[case] an: &str) {
        assert!(matches!(
            fisher_vs_reference(&CASE, ac, an),
            Err(Error::InvalidCount { .. })
        ));
    }
}
