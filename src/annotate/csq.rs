//! Ranking of VEP consequence terms by severity.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parse_display::{Display, FromStr};
use strum::IntoEnumIterator;

use super::MULTI_VALUE_SEP;

/// Putative impact level.
#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    Display,
    FromStr,
    serde::Deserialize,
    serde::Serialize,
    strum::EnumIter,
)]
#[display(style = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PutativeImpact {
    High,
    Moderate,
    Low,
    Modifier,
}

/// Consequence terms with a tabulated severity.
///
/// The discriminant is the severity rank, lower is more severe.  Any term not listed here
/// is ranked like `MODIFIER`.
#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    Display,
    FromStr,
    serde::Deserialize,
    serde::Serialize,
    strum::EnumIter,
)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Consequence {
    // high impact
    TranscriptAblation = 1,
    SpliceAcceptorVariant = 2,
    SpliceDonorVariant = 3,
    StopGained = 4,
    FrameshiftVariant = 5,
    StopLost = 6,
    StartLost = 7,
    TranscriptAmplification = 8,
    // moderate impact
    InframeInsertion = 9,
    InframeDeletion = 10,
    MissenseVariant = 11,
    ProteinAlteringVariant = 12,
    // low impact
    SpliceRegionVariant = 13,
    IncompleteTerminalCodonVariant = 14,
    StartRetainedVariant = 15,
    StopRetainedVariant = 16,
    SynonymousVariant = 17,
    // modifier
    CodingSequenceVariant = 18,
    #[display("mature_miRNA_variant")]
    #[serde(rename = "mature_miRNA_variant")]
    MatureMirnaVariant = 19,
    #[display("5_prime_UTR_variant")]
    #[serde(rename = "5_prime_UTR_variant")]
    FivePrimeUtrVariant = 20,
    #[display("3_prime_UTR_variant")]
    #[serde(rename = "3_prime_UTR_variant")]
    ThreePrimeUtrVariant = 21,
    IntronVariant = 22,
    #[display("MODIFIER")]
    #[serde(rename = "MODIFIER")]
    Modifier = 23,
}

impl Consequence {
    /// Return vector of all values of `Consequence`.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    pub fn rank(&self) -> SeverityRank {
        SeverityRank(*self as u8)
    }

    pub fn impact(&self) -> PutativeImpact {
        self.rank().into()
    }
}

/// Severity rank of a consequence term; lower is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{0}")]
pub struct SeverityRank(pub u8);

impl SeverityRank {
    /// Rank of `MODIFIER`, also used for all unknown terms.
    pub const MODIFIER: SeverityRank = SeverityRank(Consequence::Modifier as u8);
}

impl From<SeverityRank> for PutativeImpact {
    fn from(val: SeverityRank) -> Self {
        match val.0 {
            0..=8 => PutativeImpact::High,
            9..=12 => PutativeImpact::Moderate,
            13..=17 => PutativeImpact::Low,
            _ => PutativeImpact::Modifier,
        }
    }
}

/// Lookup table from consequence term to severity rank.
#[derive(Debug, Clone)]
pub struct SeverityTable {
    ranks: HashMap<String, SeverityRank>,
}

/// The table built from [`Consequence`], constructed once and never modified.
pub static VEP_SEVERITY: Lazy<SeverityTable> = Lazy::new(SeverityTable::vep);

impl SeverityTable {
    /// Build the table of the VEP consequence terms.
    pub fn vep() -> Self {
        Self {
            ranks: Consequence::iter()
                .map(|csq| (csq.to_string(), csq.rank()))
                .collect(),
        }
    }

    /// Rank of a single term, unknown terms rank as `MODIFIER`.
    pub fn rank(&self, term: &str) -> SeverityRank {
        self.ranks
            .get(term)
            .copied()
            .unwrap_or(SeverityRank::MODIFIER)
    }

    /// Return the most severe term of an `&`-separated list of terms.
    ///
    /// On ties, the first term in input order wins.  Unknown terms are returned verbatim.
    pub fn worst_consequence<'a>(&self, consequences: &'a str) -> &'a str {
        consequences
            .split(MULTI_VALUE_SEP)
            .min_by_key(|term| self.rank(term))
            .unwrap_or(consequences)
    }

    /// Rank of the most severe term of an `&`-separated list of terms.
    pub fn worst_rank(&self, consequences: &str) -> SeverityRank {
        self.rank(self.worst_consequence(consequences))
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn putative_impact_display() {
        assert_eq!(format!("{}", PutativeImpact::High), "HIGH");
        assert_eq!(format!("{}", PutativeImpact::Moderate), "MODERATE");
        assert_eq!(format!("{}", PutativeImpact::Low), "LOW");
        assert_eq!(format!("{}", PutativeImpact::Modifier), "MODIFIER");
    }

    #[test]
    fn consequence_display() {
        assert_eq!(
            format!("{}", Consequence::TranscriptAblation),
            "transcript_ablation"
        );
        assert_eq!(
            format!("{}", Consequence::IncompleteTerminalCodonVariant),
            "incomplete_terminal_codon_variant"
        );
        assert_eq!(
            format!("{}", Consequence::MatureMirnaVariant),
            "mature_miRNA_variant"
        );
        assert_eq!(
            format!("{}", Consequence::FivePrimeUtrVariant),
            "5_prime_UTR_variant"
        );
        assert_eq!(
            format!("{}", Consequence::ThreePrimeUtrVariant),
            "3_prime_UTR_variant"
        );
        assert_eq!(format!("{}", Consequence::Modifier), "MODIFIER");
    }

    #[test]
    fn consequence_from_str() -> Result<(), anyhow::Error> {
        assert_eq!(
            Consequence::from_str("missense_variant")?,
            Consequence::MissenseVariant
        );
        assert_eq!(
            Consequence::from_str("3_prime_UTR_variant")?,
            Consequence::ThreePrimeUtrVariant
        );
        assert!(Consequence::from_str("upstream_gene_variant").is_err());

        Ok(())
    }

    #[test]
    fn table_ranks() {
        let table = SeverityTable::vep();
        assert_eq!(Consequence::all().len(), 23);
        assert_eq!(table.rank("transcript_ablation"), SeverityRank(1));
        assert_eq!(table.rank("missense_variant"), SeverityRank(11));
        assert_eq!(table.rank("intron_variant"), SeverityRank(22));
        assert_eq!(table.rank("MODIFIER"), SeverityRank(23));
        assert_eq!(table.rank("upstream_gene_variant"), SeverityRank::MODIFIER);
        assert_eq!(table.rank(""), SeverityRank::MODIFIER);
    }

    #[test]
    fn rank_to_impact() {
        assert_eq!(Consequence::StopGained.impact(), PutativeImpact::High);
        assert_eq!(Consequence::MissenseVariant.impact(), PutativeImpact::Moderate);
        assert_eq!(Consequence::SynonymousVariant.impact(), PutativeImpact::Low);
        assert_eq!(Consequence::IntronVariant.impact(), PutativeImpact::Modifier);
        assert_eq!(
            PutativeImpact::from(SeverityRank::MODIFIER),
            PutativeImpact::Modifier
        );
    }

    #[test]
    fn worst_consequence_single_known_term_is_identity() {
        let table = SeverityTable::vep();
        for csq in Consequence::all() {
            let term = csq.to_string();
            assert_eq!(table.worst_consequence(&term), term.as_str());
        }
    }

    #[rstest::rstest]
    #[case("missense_variant&splice_region_variant", "missense_variant")]
    #[case("splice_region_variant&missense_variant", "missense_variant")]
    #[case("intron_variant&stop_gained&missense_variant", "stop_gained")]
    #[case("upstream_gene_variant&intron_variant", "intron_variant")]
    #[case("upstream_gene_variant&downstream_gene_variant", "upstream_gene_variant")]
    #[case("upstream_gene_variant&MODIFIER", "upstream_gene_variant")]
    #[case("MODIFIER&upstream_gene_variant", "MODIFIER")]
    #[case("", "")]
    fn worst_consequence(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(VEP_SEVERITY.worst_consequence(input), expected);
    }

    #[test]
    fn worst_rank() {
        assert_eq!(
            VEP_SEVERITY.worst_rank("synonymous_variant&NMD_transcript_variant"),
            SeverityRank(17)
        );
        assert_eq!(
            VEP_SEVERITY.worst_rank("NMD_transcript_variant"),
            SeverityRank::MODIFIER
        );
    }
}
