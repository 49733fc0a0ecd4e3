//! Per-transcript annotation records and selection of the representative transcript.

use std::convert::Infallible;
use std::str::FromStr;

use itertools::Itertools;

use super::csq::{SeverityRank, SeverityTable};
use super::{FIELD_SEP, TRANSCRIPT_SEP};
use crate::error::Error;

/// Values of the canonical flag that mark a canonical transcript.
const CANONICAL_VALUES: &[&str] = &["YES", "1"];

/// The `|`-delimited sub fields of one transcript annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranscriptAnnotation {
    fields: Vec<String>,
}

impl TranscriptAnnotation {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Sub field at `idx`.
    pub fn field(&self, idx: usize) -> Result<&str, Error> {
        self.fields
            .get(idx)
            .map(String::as_str)
            .ok_or(Error::FieldIndexOutOfRange {
                idx,
                len: self.fields.len(),
            })
    }

    /// Replace the sub field at `idx`.
    pub fn set_field(&mut self, idx: usize, value: String) -> Result<(), Error> {
        let len = self.fields.len();
        let field = self
            .fields
            .get_mut(idx)
            .ok_or(Error::FieldIndexOutOfRange { idx, len })?;
        *field = value;
        Ok(())
    }

    /// Whether the canonical flag at `canonical_idx` is set.
    pub fn is_canonical(&self, canonical_idx: usize) -> Result<bool, Error> {
        Ok(CANONICAL_VALUES.contains(&self.field(canonical_idx)?))
    }
}

impl FromStr for TranscriptAnnotation {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.split(FIELD_SEP).map(str::to_string).collect()))
    }
}

impl std::fmt::Display for TranscriptAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fields.iter().join(&FIELD_SEP.to_string()))
    }
}

/// Split a `,`-separated annotation value into its transcripts.
pub fn parse_transcripts(value: &str) -> Vec<TranscriptAnnotation> {
    value
        .split(TRANSCRIPT_SEP)
        .map(|s| TranscriptAnnotation::new(s.split(FIELD_SEP).map(str::to_string).collect()))
        .collect()
}

/// Select the representative transcript of a variant.
///
/// Transcripts are ranked by their worst consequence.  Among the transcripts with the most
/// severe rank, the first canonical one is returned, otherwise the first one in input order.
pub fn select_worst_transcript<'a>(
    transcripts: &'a [TranscriptAnnotation],
    table: &SeverityTable,
    canonical_idx: usize,
    consequence_idx: usize,
) -> Result<&'a TranscriptAnnotation, Error> {
    let ranked = transcripts
        .iter()
        .map(|tx| -> Result<(SeverityRank, &TranscriptAnnotation), Error> {
            Ok((table.worst_rank(tx.field(consequence_idx)?), tx))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let worst_rank = ranked
        .iter()
        .map(|(rank, _)| *rank)
        .min()
        .ok_or(Error::EmptyAnnotation)?;

    let mut first_worst = None;
    for (_, tx) in ranked.into_iter().filter(|(rank, _)| *rank == worst_rank) {
        if tx.is_canonical(canonical_idx)? {
            return Ok(tx);
        }
        first_worst.get_or_insert(tx);
    }

    first_worst.ok_or(Error::EmptyAnnotation)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::annotate::csq::VEP_SEVERITY;

    // layout: Feature|Consequence|CANONICAL
    const CANONICAL_IDX: usize = 2;
    const CONSEQUENCE_IDX: usize = 1;

    fn select(blob: &str) -> Result<String, Error> {
        let transcripts = parse_transcripts(blob);
        select_worst_transcript(&transcripts, &VEP_SEVERITY, CANONICAL_IDX, CONSEQUENCE_IDX)
            .map(|tx| tx.to_string())
    }

    #[test]
    fn parse_and_display() -> Result<(), anyhow::Error> {
        let transcripts = parse_transcripts("T1|missense_variant|YES,T2|intron_variant|");
        assert_eq!(transcripts.len(), 2);
        assert_eq!(transcripts[0].field(0)?, "T1");
        assert_eq!(transcripts[1].field(2)?, "");
        assert_eq!(transcripts[1].to_string(), "T2|intron_variant|");

        Ok(())
    }

    #[test]
    fn field_out_of_range() {
        let tx = TranscriptAnnotation::from_str("a|b").unwrap_or_default();
        assert_eq!(
            tx.field(5),
            Err(Error::FieldIndexOutOfRange { idx: 5, len: 2 })
        );
    }

    #[test]
    fn set_field() -> Result<(), anyhow::Error> {
        let mut tx = TranscriptAnnotation::from_str("a|b|c")?;
        tx.set_field(1, String::from("x"))?;
        assert_eq!(tx.to_string(), "a|x|c");
        assert!(tx.set_field(3, String::new()).is_err());

        Ok(())
    }

    #[rstest::rstest]
    #[case::single("T1|intron_variant|", "T1|intron_variant|")]
    #[case::most_severe(
        "T1|intron_variant|YES,T2|stop_gained|,T3|missense_variant|",
        "T2|stop_gained|"
    )]
    #[case::canonical_among_worst(
        "T1|missense_variant|,T2|missense_variant|YES,T3|intron_variant|YES",
        "T2|missense_variant|YES"
    )]
    #[case::canonical_one_flag(
        "T1|missense_variant|,T2|missense_variant|1",
        "T2|missense_variant|1"
    )]
    #[case::canonical_not_worst(
        "T1|intron_variant|YES,T2|missense_variant|,T3|missense_variant|",
        "T2|missense_variant|"
    )]
    #[case::compound_consequence(
        "T1|intron_variant&missense_variant|,T2|splice_region_variant|YES",
        "T1|intron_variant&missense_variant|"
    )]
    #[case::unknown_terms(
        "T1|upstream_gene_variant|,T2|downstream_gene_variant|YES",
        "T2|downstream_gene_variant|YES"
    )]
    fn select_worst(#[case] blob: &str, #[case] expected: &str) -> Result<(), anyhow::Error> {
        assert_eq!(select(blob)?, expected);

        Ok(())
    }

    #[test]
    fn select_canonical_regardless_of_position() -> Result<(), anyhow::Error> {
        let others = (0..5)
            .map(|i| format!("T{}|stop_gained|", i))
            .collect::<Vec<_>>();
        for pos in 0..=others.len() {
            let mut all = others.clone();
            all.insert(pos, String::from("C|stop_gained|YES"));
            assert_eq!(select(&all.join(","))?, "C|stop_gained|YES");
        }

        Ok(())
    }

    #[test]
    fn select_from_empty() {
        assert_eq!(
            select_worst_transcript(&[], &VEP_SEVERITY, CANONICAL_IDX, CONSEQUENCE_IDX),
            Err(Error::EmptyAnnotation)
        );
    }

    #[test]
    fn select_with_missing_consequence_field() {
        assert_eq!(
            select("T1"),
            Err(Error::FieldIndexOutOfRange { idx: 1, len: 1 })
        );
    }
}
