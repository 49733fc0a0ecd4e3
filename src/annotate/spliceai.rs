//! Maximum SpliceAI delta score of a variant.

use super::schema::CsqSchema;
use super::{FIELD_SEP, TRANSCRIPT_SEP};

/// Suffixes of the SpliceAI delta score sub fields (acceptor gain/loss, donor gain/loss).
pub const DELTA_SCORE_SUFFIXES: &[&str] = &["DS_AG", "DS_AL", "DS_DG", "DS_DL"];

/// Indices of the four SpliceAI delta score sub fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpliceAiColumns {
    idxs: Vec<usize>,
}

impl SpliceAiColumns {
    /// Locate the delta score sub fields in `schema`.
    ///
    /// If any of them is not declared, no score will be computed.
    pub fn from_schema(schema: &CsqSchema) -> Self {
        let mut idxs = Vec::with_capacity(DELTA_SCORE_SUFFIXES.len());
        for suffix in DELTA_SCORE_SUFFIXES {
            match schema.find_suffix(suffix).first() {
                Some((_, idx)) => idxs.push(*idx),
                None => {
                    tracing::warn!(
                        "no SpliceAI {} sub field declared for {}, not reporting SpliceAI scores",
                        suffix,
                        schema.tag()
                    );
                    return Self::default();
                }
            }
        }
        Self { idxs }
    }

    pub fn is_empty(&self) -> bool {
        self.idxs.is_empty()
    }

    /// Maximum of the delta scores in the raw annotation value.
    ///
    /// SpliceAI scores are identical for all transcripts, so only the first transcript is
    /// considered.  Returns `None` if any of the scores is missing or not a number.
    pub fn max_delta_score(&self, annotation: &str) -> Option<f64> {
        if self.idxs.is_empty() {
            return None;
        }
        let first = annotation.split(TRANSCRIPT_SEP).next()?;
        let fields = first.split(FIELD_SEP).collect::<Vec<_>>();
        self.idxs
            .iter()
            .map(|idx| fields.get(*idx).and_then(|v| v.parse::<f64>().ok()))
            .try_fold(f64::NEG_INFINITY, |max, score| score.map(|s| max.max(s)))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn columns() -> SpliceAiColumns {
        SpliceAiColumns::from_schema(&CsqSchema::new(
            "CSQ",
            [
                "Allele",
                "SpliceAI_pred_DS_AG",
                "SpliceAI_pred_DS_AL",
                "SpliceAI_pred_DS_DG",
                "SpliceAI_pred_DS_DL",
            ],
        ))
    }

    #[rstest::rstest]
    #[case("A|0.01|0.20|0.00|0.03", Some(0.2))]
    #[case("A|0.00|0.00|0.00|0.00", Some(0.0))]
    #[case("A|0.01|0.02|0.03|0.50,A|0.9|0.9|0.9|0.9", Some(0.5))]
    #[case("A|0.01||0.00|0.03", None)]
    #[case("A|0.01|0.20", None)]
    fn max_delta_score(#[case] annotation: &str, #[case] expected: Option<f64>) {
        assert_eq!(columns().max_delta_score(annotation), expected);
    }

    #[test]
    fn undeclared_columns() {
        let columns = SpliceAiColumns::from_schema(&CsqSchema::new(
            "CSQ",
            ["Allele", "SpliceAI_pred_DS_AG"],
        ));
        assert!(columns.is_empty());
        assert_eq!(columns.max_delta_score("A|0.5"), None);
    }
}
