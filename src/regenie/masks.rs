//! Creation of the Regenie gene burden input files.
//!
//! Every variant is assigned a category from the consequence and CADD score of its worst
//! transcript.  Three files are written next to each other:
//!
//! - `<prefix>.annotation`: `<variant> <gene> <category>` per variant,
//! - `<prefix>.set_list`: `<gene> <chrom> <pos> <variant>,<variant>,...` per gene,
//! - `<prefix>.masks`: `<mask> <category>,<category>,...` for the fixed set of masks.

use std::collections::BTreeSet;
use std::io::Write;
use std::time::Instant;

use clap::Parser;
use indexmap::IndexMap;
use itertools::Itertools;
use parse_display::Display;

use crate::annotate::csq::VEP_SEVERITY;
use crate::annotate::transcript::{parse_transcripts, select_worst_transcript};
use crate::annotate::DEFAULT_CSQ_TAG;
use crate::common::io::std::open_write_maybe_gz;
use crate::variants::source::{CohortVariant, VcfVariantSource};

/// Command line arguments for `regenie masks` sub command.
#[derive(Parser, Debug)]
#[command(about = "Create Regenie annotation, set list and mask files", long_about = None)]
pub struct Args {
    /// Path to the annotated, filtered VCF with variant IDs.
    #[arg(long)]
    pub path_input_vcf: String,
    /// Minimal CADD PHRED score of the `high_cadd` category.
    #[arg(long)]
    pub high_cadd_threshold: f64,
    /// Prefix of the output files.
    #[arg(long, default_value = "regenie_input")]
    pub path_output_prefix: String,
    /// INFO tag with the VEP annotation.
    #[arg(long, default_value = DEFAULT_CSQ_TAG)]
    pub csq_tag: String,
}

/// Category label of variants without any category, ignored by Regenie.
pub const NO_CATEGORY: &str = "None";

/// Variant categories that make up the masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(style = "snake_case")]
pub enum MaskCategory {
    Missense,
    HighCadd,
    Nonsense,
    EssentialSplice,
}

impl MaskCategory {
    /// Categories of a variant given its worst consequence and CADD PHRED score.
    pub fn assign(
        worst_consequence: &str,
        cadd_phred: &str,
        high_cadd_threshold: f64,
    ) -> Result<Vec<Self>, anyhow::Error> {
        let cadd_phred = if cadd_phred.is_empty() {
            None
        } else {
            Some(cadd_phred.parse::<f64>().map_err(|e| {
                anyhow::anyhow!("invalid CADD PHRED score {:?}: {}", cadd_phred, e)
            })?)
        };

        let mut categories = Vec::new();
        if worst_consequence == "missense_variant" {
            categories.push(Self::Missense);
        }
        if cadd_phred.is_some_and(|score| score >= high_cadd_threshold) {
            categories.push(Self::HighCadd);
        }
        if worst_consequence == "stop_gained" {
            categories.push(Self::Nonsense);
        }
        if ["splice_acceptor_variant", "splice_donor_variant"].contains(&worst_consequence) {
            categories.push(Self::EssentialSplice);
        }
        Ok(categories)
    }

    /// The combined label of a set of categories.
    pub fn label(categories: &[Self]) -> String {
        if categories.is_empty() {
            NO_CATEGORY.to_string()
        } else {
            categories.iter().join("_")
        }
    }
}

/// Masks written to the mask file and the predicate selecting their category labels.
const MASKS: &[(&str, fn(&str) -> bool)] = &[
    ("mask_missense", |c| c.contains("missense")),
    ("mask_cadd", |c| c.contains("high_cadd")),
    ("mask_missense_cadd", |c| {
        c.contains("missense") && c.contains("high_cadd")
    }),
    ("mask_nonsense_splice", |c| {
        c.contains("nonsense") || c.contains("essential_splice")
    }),
];

/// Variants of one gene for the set list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneSet {
    pub chrom: String,
    /// Position of the first variant of the gene.
    pub pos: usize,
    pub variants: Vec<String>,
}

/// Accumulates set list and mask categories over all variants.
#[derive(Debug, Clone, Default)]
pub struct MaskSets {
    pub genes: IndexMap<String, GeneSet>,
    pub categories: BTreeSet<String>,
}

impl MaskSets {
    /// Register a variant of `gene` with the given category label.
    pub fn add(&mut self, variant: &CohortVariant, gene: &str, label: &str) {
        if label != NO_CATEGORY {
            self.categories.insert(label.to_string());
        }
        self.genes
            .entry(gene.to_string())
            .or_insert_with(|| GeneSet {
                chrom: variant.chrom.clone(),
                pos: variant.pos,
                variants: Vec::new(),
            })
            .variants
            .push(variant.id.clone());
    }

    pub fn write_set_list<W: Write>(&self, writer: &mut W) -> Result<(), anyhow::Error> {
        for (gene, set) in &self.genes {
            writeln!(
                writer,
                "{} {} {} {}",
                gene,
                set.chrom,
                set.pos,
                set.variants.join(",")
            )?;
        }
        Ok(())
    }

    pub fn write_masks<W: Write>(&self, writer: &mut W) -> Result<(), anyhow::Error> {
        for (mask, selects) in MASKS {
            writeln!(
                writer,
                "{} {}",
                mask,
                self.categories.iter().filter(|c| selects(c)).join(",")
            )?;
        }
        Ok(())
    }
}

/// Main entry point for `regenie masks` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);
    let start = Instant::now();

    let mut source = VcfVariantSource::open(&args.path_input_vcf, &args.csq_tag)?;
    let schema = source.schema()?;
    let idx_gene = schema.field_idx("Gene")?;
    let idx_consequence = schema.field_idx("Consequence")?;
    let idx_canonical = schema.field_idx("CANONICAL")?;
    let idx_cadd_phred = schema.field_idx("CADD_PHRED")?;

    let mut annotation_writer =
        open_write_maybe_gz(format!("{}.annotation", args.path_output_prefix))?;
    let mut sets = MaskSets::default();
    let mut count = 0;

    while let Some(variant) = source.read_variant()? {
        let Some(annotation) = variant.annotation.as_deref() else {
            tracing::warn!("variant {} has no {} annotation, skipping", variant.id, args.csq_tag);
            continue;
        };
        let transcripts = parse_transcripts(annotation);
        let worst = select_worst_transcript(
            &transcripts,
            &VEP_SEVERITY,
            idx_canonical,
            idx_consequence,
        )
        .map_err(|e| anyhow::anyhow!("error processing variant {}: {}", variant.id, e))?;
        let consequence = VEP_SEVERITY.worst_consequence(worst.field(idx_consequence)?);
        let gene = worst.field(idx_gene)?;
        let categories = MaskCategory::assign(
            consequence,
            worst.field(idx_cadd_phred)?,
            args.high_cadd_threshold,
        )
        .map_err(|e| anyhow::anyhow!("error processing variant {}: {}", variant.id, e))?;
        let label = MaskCategory::label(&categories);

        writeln!(annotation_writer, "{} {} {}", variant.id, gene, label)?;
        sets.add(&variant, gene, &label);
        count += 1;
    }
    annotation_writer.flush()?;

    let mut set_list_writer = open_write_maybe_gz(format!("{}.set_list", args.path_output_prefix))?;
    sets.write_set_list(&mut set_list_writer)?;
    set_list_writer.flush()?;

    let mut masks_writer = open_write_maybe_gz(format!("{}.masks", args.path_output_prefix))?;
    sets.write_masks(&mut masks_writer)?;
    masks_writer.flush()?;

    tracing::info!(
        "... wrote {} variants of {} genes in {:?}",
        count,
        sets.genes.len(),
        start.elapsed()
    );
    Ok(())
}
