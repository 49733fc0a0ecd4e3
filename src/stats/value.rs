//! Reported values and their stable text representation.

use std::fmt;

/// Text written for missing values.
pub const NA: &str = "NA";

/// A value of the result report.
///
/// Integers and floats are kept apart so that an integral count prints as `3` while a
/// frequency prints as `3.0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReportValue {
    #[default]
    Na,
    Int(i64),
    Float(f64),
    Text(String),
}

impl ReportValue {
    /// Wrap a text value, empty values and `NA` become [`ReportValue::Na`].
    pub fn text<S: Into<String>>(value: S) -> Self {
        let value = value.into();
        if value.is_empty() || value == NA {
            Self::Na
        } else {
            Self::Text(value)
        }
    }

    pub fn is_na(&self) -> bool {
        matches!(self, Self::Na)
    }

    /// Numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.parse().ok(),
            Self::Na => None,
        }
    }
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Na => write!(f, "{}", NA),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", format_float(*v)),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ReportValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for ReportValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Self::Int)
            .unwrap_or(Self::Float(value as f64))
    }
}

impl From<f64> for ReportValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Option<f64>> for ReportValue {
    fn from(value: Option<f64>) -> Self {
        value.map(Self::Float).unwrap_or_default()
    }
}

/// Format a float in its shortest round-trip form.
///
/// Integral values keep a `.0` suffix, magnitudes below `1e-4` or from `1e16` on use
/// scientific notation with a signed two digit exponent (`1e-05`, `2.5e+16`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return String::from("nan");
    } else if value.is_infinite() {
        return String::from(if value > 0.0 { "inf" } else { "-inf" });
    }

    let sci = format!("{:e}", value);
    if let Some((mantissa, exp)) = sci.split_once('e') {
        let exp: i32 = exp.parse().unwrap_or_default();
        if value != 0.0 && !(-4..16).contains(&exp) {
            let sign = if exp < 0 { '-' } else { '+' };
            return format!("{}e{}{:02}", mantissa, sign, exp.abs());
        }
    }

    let plain = format!("{}", value);
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

/// Round to `digits` decimal places, ties to even on the exact decimal expansion.
///
/// Negative `digits` round to tens, hundreds, and so on.
pub fn round_decimals(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    if digits >= 0 {
        format!("{:.*}", digits as usize, value)
            .parse()
            .unwrap_or(value)
    } else {
        let scale = 10f64.powi(-digits);
        (value / scale).round_ties_even() * scale
    }
}

/// Round to `digits` significant digits.
pub fn round_to_significant_digits(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    round_decimals(value, digits - magnitude - 1)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[rstest::rstest]
    #[case(0.75, "0.75")]
    #[case(1.0, "1.0")]
    #[case(0.0, "0.0")]
    #[case(-0.0, "-0.0")]
    #[case(12.5, "12.5")]
    #[case(0.0001, "0.0001")]
    #[case(0.00001, "1e-05")]
    #[case(2.37e-7, "2.37e-07")]
    #[case(1.5e-123, "1.5e-123")]
    #[case(1e15, "1000000000000000.0")]
    #[case(1e16, "1e+16")]
    #[case(0.1 + 0.2, "0.30000000000000004")]
    #[case(f64::INFINITY, "inf")]
    #[case(f64::NEG_INFINITY, "-inf")]
    #[case(f64::NAN, "nan")]
    fn format_float(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(super::format_float(value), expected);
    }

    #[test]
    fn report_value_display() {
        assert_eq!(ReportValue::Na.to_string(), "NA");
        assert_eq!(ReportValue::Int(0).to_string(), "0");
        assert_eq!(ReportValue::Float(0.237).to_string(), "0.237");
        assert_eq!(ReportValue::text("D").to_string(), "D");
        assert_eq!(ReportValue::from(Some(0.5)).to_string(), "0.5");
        assert_eq!(ReportValue::from(None).to_string(), "NA");
    }

    #[test]
    fn report_value_text_missing() {
        assert!(ReportValue::text("").is_na());
        assert!(ReportValue::text("NA").is_na());
        assert!(!ReportValue::text("0").is_na());
    }

    #[test]
    fn report_value_as_f64() {
        assert_eq!(ReportValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ReportValue::text("0.01").as_f64(), Some(0.01));
        assert_eq!(ReportValue::text("0.01&0.02").as_f64(), None);
        assert_eq!(ReportValue::Na.as_f64(), None);
    }

    #[rstest::rstest]
    #[case(0.236842, 3, 0.237)]
    #[case(0.62554, 4, 0.6255)]
    #[case(2.675, 2, 2.67)]
    #[case(0.125, 2, 0.12)]
    #[case(1234.5, -2, 1200.0)]
    #[case(1250.0, -2, 1200.0)]
    fn round_decimals(#[case] value: f64, #[case] digits: i32, #[case] expected: f64) {
        assert_eq!(super::round_decimals(value, digits), expected);
    }

    #[rstest::rstest]
    #[case(0.75, 0.75)]
    #[case(1.0 / 3.0, 0.333)]
    #[case(0.000123456, 0.000123)]
    #[case(0.23684210526315788, 0.237)]
    #[case(123456.0, 123000.0)]
    #[case(0.0, 0.0)]
    fn round_to_significant_digits(#[case] value: f64, #[case] expected: f64) {
        assert_eq!(super::round_to_significant_digits(value, 3), expected);
    }
}
