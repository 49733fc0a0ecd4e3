//! Variant level case-control results merged with Regenie association output.
//!
//! Each annotated variant is reduced to its worst transcript, the cases and controls of the
//! cohort are counted, and Fisher's exact tests against the controls, gnomAD genomes
//! (`gnomADg_*`) and gnomAD v2 exomes (`gnomADe2_*`) are run.  The results are written as
//! a space delimited table and as a VCF-like file for HiGlass.

use std::io::Write;
use std::time::Instant;

use clap::Parser;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::annotate::csq::VEP_SEVERITY;
use crate::annotate::dbnsfp::{DbnsfpResolver, TRANSCRIPT_ID_FIELD};
use crate::annotate::schema::CsqSchema;
use crate::annotate::spliceai::SpliceAiColumns;
use crate::annotate::transcript::select_worst_transcript;
use crate::annotate::DEFAULT_CSQ_TAG;
use crate::common::io::std::open_write_maybe_gz;
use crate::higlass::{write_vcf_header, HIGLASS_FILTER, HIGLASS_QUAL};
use crate::regenie::output::{self, VARIANT_COLUMNS};
use crate::samples::{Cohort, Partition};
use crate::stats::fisher::{fisher_vs_cohort, fisher_vs_reference, FisherResult};
use crate::stats::genotypes::{summarize_genotypes, AlleleSummary};
use crate::stats::value::ReportValue;
use crate::variants::source::{CohortVariant, VcfVariantSource};

/// Command line arguments for `variants results` sub command.
#[derive(Parser, Debug)]
#[command(about = "Create variant level result table and HiGlass variant file", long_about = None)]
pub struct Args {
    /// Path to the variant level Regenie output.
    #[arg(long)]
    pub path_regenie_output: String,
    /// Path to the annotated, jointly called VCF.
    #[arg(long)]
    pub path_input_vcf: String,
    /// Sample information as JSON, or `@path` of a JSON file.
    #[arg(long)]
    pub sample_info: String,
    /// Path to the result table.
    #[arg(long)]
    pub path_output: String,
    /// Variants with a gnomAD genomes AF above are left out of the HiGlass file.
    #[arg(long)]
    pub af_threshold_higlass: f64,
    /// Path to the HiGlass variant file.
    #[arg(long)]
    pub path_higlass_vcf: String,
    /// INFO tag with the VEP annotation.
    #[arg(long, default_value = DEFAULT_CSQ_TAG)]
    pub csq_tag: String,
}

/// Configuration of the result computation.
#[derive(Debug, Clone, PartialEq, derive_builder::Builder)]
#[builder(pattern = "immutable")]
pub struct Config {
    /// INFO tag with the VEP annotation.
    #[builder(default = "DEFAULT_CSQ_TAG.to_string()", setter(into))]
    pub csq_tag: String,
    /// Variants with a gnomAD genomes AF above are left out of the HiGlass file.
    #[builder(default = "1.0")]
    pub af_threshold_higlass: f64,
}

/// Indices of the `CSQ` sub fields that are reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsqFields {
    pub consequence: usize,
    pub canonical: usize,
    pub impact: usize,
    pub feature: usize,
    pub cadd_phred: usize,
    pub cadd_raw_rankscore: usize,
    pub polyphen_pred: usize,
    pub polyphen_rankscore: usize,
    pub polyphen_score: usize,
    pub gerp_score: usize,
    pub gerp_rankscore: usize,
    pub sift_rankscore: usize,
    pub sift_pred: usize,
    pub sift_score: usize,
    pub gnomadg_ac: usize,
    pub gnomadg_an: usize,
    pub gnomadg_af: usize,
    pub gnomade2_ac: usize,
    pub gnomade2_an: usize,
    pub gnomade2_af: usize,
}

impl CsqFields {
    pub fn from_schema(schema: &CsqSchema) -> Result<Self, crate::Error> {
        Ok(Self {
            consequence: schema.field_idx("Consequence")?,
            canonical: schema.field_idx("CANONICAL")?,
            impact: schema.field_idx("IMPACT")?,
            feature: schema.field_idx(TRANSCRIPT_ID_FIELD)?,
            cadd_phred: schema.field_idx("CADD_PHRED")?,
            cadd_raw_rankscore: schema.field_idx("CADD_raw_rankscore")?,
            polyphen_pred: schema.field_idx("Polyphen2_HVAR_pred")?,
            polyphen_rankscore: schema.field_idx("Polyphen2_HVAR_rankscore")?,
            polyphen_score: schema.field_idx("Polyphen2_HVAR_score")?,
            gerp_score: schema.field_idx("GERP++_RS")?,
            gerp_rankscore: schema.field_idx("GERP++_RS_rankscore")?,
            sift_rankscore: schema.field_idx("SIFT_converted_rankscore")?,
            sift_pred: schema.field_idx("SIFT_pred")?,
            sift_score: schema.field_idx("SIFT_score")?,
            gnomadg_ac: schema.field_idx("gnomADg_AC")?,
            gnomadg_an: schema.field_idx("gnomADg_AN")?,
            gnomadg_af: schema.field_idx("gnomADg_AF")?,
            gnomade2_ac: schema.field_idx("gnomADe2_AC")?,
            gnomade2_an: schema.field_idx("gnomADe2_AN")?,
            gnomade2_af: schema.field_idx("gnomADe2_AF")?,
        })
    }
}

/// Allele counts of a reference population as annotated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceCounts {
    pub ac: ReportValue,
    pub an: ReportValue,
    pub af: ReportValue,
}

/// Fields taken from the Regenie output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegenieFields {
    pub test: ReportValue,
    pub beta: ReportValue,
    pub se: ReportValue,
    pub chisq: ReportValue,
    pub log10p: ReportValue,
}

impl From<&output::Record> for RegenieFields {
    fn from(record: &output::Record) -> Self {
        Self {
            test: ReportValue::text(record.test.as_str()),
            beta: ReportValue::text(record.beta.as_str()),
            se: ReportValue::text(record.se.as_str()),
            chisq: ReportValue::text(record.chisq.as_str()),
            log10p: ReportValue::text(record.log10p.as_str()),
        }
    }
}

/// One row of the result table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariantResult {
    pub chrom: String,
    pub pos: usize,
    pub id: String,
    pub reference: String,
    pub alternative: String,

    pub transcript: ReportValue,
    pub most_severe_consequence: ReportValue,
    pub level_most_severe_consequence: ReportValue,

    pub case: AlleleSummary,
    pub control: AlleleSummary,

    pub cadd_raw_rs: ReportValue,
    pub cadd_phred: ReportValue,
    pub polyphen_pred: ReportValue,
    pub polyphen_rankscore: ReportValue,
    pub polyphen_score: ReportValue,
    pub gerp_score: ReportValue,
    pub gerp_rankscore: ReportValue,
    pub sift_rankscore: ReportValue,
    pub sift_pred: ReportValue,
    pub sift_score: ReportValue,
    pub spliceai_score_max: ReportValue,

    pub gnomadg: ReferenceCounts,
    pub gnomade2: ReferenceCounts,

    pub fisher_gnomadg: FisherResult,
    pub fisher_gnomade2: FisherResult,
    pub fisher_control: FisherResult,

    pub regenie: RegenieFields,

    pub include_for_higlass: bool,
}

/// Column names and descriptions of the result table.
pub const TABLE_COLUMNS: &[(&str, &str)] = &[
    ("CHROM", "chromosome"),
    ("GENPOS", "position with in the chromosome"),
    ("ID", "variant ID"),
    ("ALLELE0", "reference allele"),
    ("ALLELE1", "alternative allele"),
    (
        "R_TEST",
        "test performed by Regenie (additive/dominant/recessive)",
    ),
    ("R_BETA", "estimated effect sizes (Regenie)"),
    ("R_SE", "standard error of the Regenie test"),
    ("R_CHISQ", "chi-square test statistics of the Regenie test"),
    ("R_LOG10P", "-log10(p) of the Regenie test"),
    ("CASE_AF", "case allele frequency"),
    ("CASE_N", "number of affected samples"),
    ("CONTROL_AF", "control allele frequency"),
    ("CONTROL_N", "number of control samples"),
    (
        "F_LOG10P_CONTROL",
        "-log10(p) of a Fisher exact test with cases vs. control",
    ),
    (
        "F_OR_CONTROL",
        "odds ratio of a Fisher exact test with cases vs. control",
    ),
    (
        "F_LOG10P_GNOMADG",
        "-log10(p) of a Fisher exact test when gnomAD 3 is used as control group",
    ),
    (
        "F_OR_GNOMADG",
        "odds ratio of a Fisher exact test when gnomAD 3 is used as control group",
    ),
    (
        "F_LOG10P_GNOMADE2",
        "-log10(p) of a Fisher exact test when gnomAD 2 is used as control group",
    ),
    (
        "F_OR_GNOMADE2",
        "odds ratio of a Fisher exact test when gnomAD 2 is used as control group",
    ),
    ("CADD_RAW_RS", "CADD rankscore"),
    ("CADD_PHRED", "CADD Phred score"),
    ("POLYPHEN_PRED", "PolyPhen 2 prediction"),
    ("POLYPHEN_RANKSCORE", "PolyPhen 2 rankscore"),
    ("POLYPHEN_SCORE", "PolyPhen 2 score"),
    ("GERP_SCORE", "Gerp++ score"),
    ("GERP_RANKSCORE", "Gerp++ rankscore"),
    ("SIFT_RANKSCORE", "SIFT rankscore"),
    ("SIFT_PRED", "SIFT prediction"),
    ("SIFT_SCORE", "SIFT score"),
    (
        "SPLICEAI_MAX_SCORE",
        "SpliceAI predicts whether a variant causes a splice acceptor gain or loss, \
        or a splice donor gain or loss. The score shown here is the max score of these four scores",
    ),
];

impl VariantResult {
    /// Values of the table row, in the order of [`TABLE_COLUMNS`].
    pub fn table_row(&self) -> Vec<String> {
        vec![
            self.chrom.clone(),
            self.pos.to_string(),
            self.id.clone(),
            self.reference.clone(),
            self.alternative.clone(),
            self.regenie.test.to_string(),
            self.regenie.beta.to_string(),
            self.regenie.se.to_string(),
            self.regenie.chisq.to_string(),
            self.regenie.log10p.to_string(),
            self.case.af().to_string(),
            self.case.n().to_string(),
            self.control.af().to_string(),
            self.control.n().to_string(),
            self.fisher_control.minus_log10_p.to_string(),
            self.fisher_control.odds_ratio.to_string(),
            self.fisher_gnomadg.minus_log10_p.to_string(),
            self.fisher_gnomadg.odds_ratio.to_string(),
            self.fisher_gnomade2.minus_log10_p.to_string(),
            self.fisher_gnomade2.odds_ratio.to_string(),
            self.cadd_raw_rs.to_string(),
            self.cadd_phred.to_string(),
            self.polyphen_pred.to_string(),
            self.polyphen_rankscore.to_string(),
            self.polyphen_score.to_string(),
            self.gerp_score.to_string(),
            self.gerp_rankscore.to_string(),
            self.sift_rankscore.to_string(),
            self.sift_pred.to_string(),
            self.sift_score.to_string(),
            self.spliceai_score_max.to_string(),
        ]
    }

    /// Key-value pairs of the HiGlass INFO column, including `NA` values.
    pub fn info_fields(&self) -> Vec<(&'static str, ReportValue)> {
        vec![
            ("transcript", self.transcript.clone()),
            ("case_AC", self.case.ac.into()),
            ("case_AN", self.case.an.into()),
            ("case_AF", self.case.af()),
            ("control_AC", self.control.ac.into()),
            ("control_AN", self.control.an.into()),
            ("control_AF", self.control.af()),
            ("gnomADg_AC", self.gnomadg.ac.clone()),
            ("gnomADg_AN", self.gnomadg.an.clone()),
            ("gnomADg_AF", self.gnomadg.af.clone()),
            ("gnomADe2_AC", self.gnomade2.ac.clone()),
            ("gnomADe2_AN", self.gnomade2.an.clone()),
            ("gnomADe2_AF", self.gnomade2.af.clone()),
            ("most_severe_consequence", self.most_severe_consequence.clone()),
            (
                "level_most_severe_consequence",
                self.level_most_severe_consequence.clone(),
            ),
            ("cadd_raw_rs", self.cadd_raw_rs.clone()),
            ("cadd_phred", self.cadd_phred.clone()),
            ("polyphen_pred", self.polyphen_pred.clone()),
            ("polyphen_rankscore", self.polyphen_rankscore.clone()),
            ("polyphen_score", self.polyphen_score.clone()),
            ("gerp_score", self.gerp_score.clone()),
            ("gerp_rankscore", self.gerp_rankscore.clone()),
            ("sift_rankscore", self.sift_rankscore.clone()),
            ("sift_pred", self.sift_pred.clone()),
            ("sift_score", self.sift_score.clone()),
            ("spliceai_score_max", self.spliceai_score_max.clone()),
            ("fisher_or_gnomADg", self.fisher_gnomadg.odds_ratio.clone()),
            ("fisher_ml10p_gnomADg", self.fisher_gnomadg.minus_log10_p.clone()),
            ("fisher_or_gnomADe2", self.fisher_gnomade2.odds_ratio.clone()),
            (
                "fisher_ml10p_gnomADe2",
                self.fisher_gnomade2.minus_log10_p.clone(),
            ),
            ("fisher_or_control", self.fisher_control.odds_ratio.clone()),
            ("fisher_ml10p_control", self.fisher_control.minus_log10_p.clone()),
            ("regenie_ml10p", self.regenie.log10p.clone()),
            ("regenie_beta", self.regenie.beta.clone()),
            ("regenie_chisq", self.regenie.chisq.clone()),
            ("regenie_se", self.regenie.se.clone()),
        ]
    }

    /// The HiGlass INFO column, leaving out `NA` values.
    pub fn higlass_info(&self) -> String {
        self.info_fields()
            .into_iter()
            .filter(|(_, value)| !value.is_na())
            .map(|(key, value)| format!("{}={}", key, value))
            .join(";")
    }
}

/// Computes [`VariantResult`]s of the variants of one VCF file.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    config: Config,
    fields: CsqFields,
    dbnsfp: DbnsfpResolver,
    spliceai: SpliceAiColumns,
    partition: Partition,
}

impl ResultBuilder {
    pub fn new(
        config: Config,
        schema: &CsqSchema,
        partition: Partition,
    ) -> Result<Self, anyhow::Error> {
        Ok(Self {
            config,
            fields: CsqFields::from_schema(schema)?,
            dbnsfp: DbnsfpResolver::from_schema(schema)?,
            spliceai: SpliceAiColumns::from_schema(schema),
            partition,
        })
    }

    /// Compute the result of one variant, `None` if the variant is not annotated.
    pub fn process_variant(
        &self,
        variant: &CohortVariant,
    ) -> Result<Option<VariantResult>, anyhow::Error> {
        self.build_result(variant)
            .map_err(|e| anyhow::anyhow!("error processing variant {}: {}", variant.id, e))
    }

    fn build_result(
        &self,
        variant: &CohortVariant,
    ) -> Result<Option<VariantResult>, anyhow::Error> {
        let Some(transcripts) = self
            .dbnsfp
            .resolve_annotation(variant.annotation.as_deref())?
        else {
            return Ok(None);
        };
        let worst = select_worst_transcript(
            &transcripts,
            &VEP_SEVERITY,
            self.fields.canonical,
            self.fields.consequence,
        )?;
        let text = |idx: usize| -> Result<ReportValue, crate::Error> {
            Ok(ReportValue::text(worst.field(idx)?))
        };

        let case = summarize_genotypes(variant.genotypes_of(&self.partition.cases), &variant.id)?;
        let control =
            summarize_genotypes(variant.genotypes_of(&self.partition.controls), &variant.id)?;

        let gnomadg_ac = worst.field(self.fields.gnomadg_ac)?;
        let gnomadg_an = worst.field(self.fields.gnomadg_an)?;
        let gnomadg_af = worst.field(self.fields.gnomadg_af)?;
        let gnomade2_ac = worst.field(self.fields.gnomade2_ac)?;
        let gnomade2_an = worst.field(self.fields.gnomade2_an)?;

        // A maximum delta score of zero is reported as missing.
        let spliceai_score_max = variant
            .annotation
            .as_deref()
            .and_then(|annotation| self.spliceai.max_delta_score(annotation))
            .filter(|score| *score != 0.0);

        Ok(Some(VariantResult {
            chrom: variant.chrom.clone(),
            pos: variant.pos,
            id: variant.id.clone(),
            reference: variant.reference.clone(),
            alternative: variant.alternative.clone(),

            transcript: text(self.fields.feature)?,
            most_severe_consequence: ReportValue::text(
                VEP_SEVERITY.worst_consequence(worst.field(self.fields.consequence)?),
            ),
            level_most_severe_consequence: text(self.fields.impact)?,

            case,
            control,

            cadd_raw_rs: text(self.fields.cadd_raw_rankscore)?,
            cadd_phred: text(self.fields.cadd_phred)?,
            polyphen_pred: text(self.fields.polyphen_pred)?,
            polyphen_rankscore: text(self.fields.polyphen_rankscore)?,
            polyphen_score: text(self.fields.polyphen_score)?,
            gerp_score: text(self.fields.gerp_score)?,
            gerp_rankscore: text(self.fields.gerp_rankscore)?,
            sift_rankscore: text(self.fields.sift_rankscore)?,
            sift_pred: text(self.fields.sift_pred)?,
            sift_score: text(self.fields.sift_score)?,
            spliceai_score_max: spliceai_score_max.into(),

            gnomadg: ReferenceCounts {
                ac: ReportValue::text(gnomadg_ac),
                an: ReportValue::text(gnomadg_an),
                af: ReportValue::text(gnomadg_af),
            },
            gnomade2: ReferenceCounts {
                ac: ReportValue::text(gnomade2_ac),
                an: ReportValue::text(gnomade2_an),
                af: text(self.fields.gnomade2_af)?,
            },

            fisher_gnomadg: fisher_vs_reference(&case, gnomadg_ac, gnomadg_an)?,
            fisher_gnomade2: fisher_vs_reference(&case, gnomade2_ac, gnomade2_an)?,
            fisher_control: fisher_vs_cohort(&case, &control),

            regenie: RegenieFields::default(),

            include_for_higlass: self.include_for_higlass(gnomadg_af)?,
        }))
    }

    /// Whether a variant with the given gnomAD genomes AF goes into the HiGlass file.
    fn include_for_higlass(&self, gnomadg_af: &str) -> Result<bool, anyhow::Error> {
        if gnomadg_af.is_empty() {
            return Ok(true);
        }
        let af: f64 = gnomadg_af
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid gnomADg_AF {:?}: {}", gnomadg_af, e))?;
        Ok(af <= self.config.af_threshold_higlass)
    }
}

/// Result table keyed by variant ID, in VCF order.
pub type ResultTable = IndexMap<String, VariantResult>;

/// Compute the results of all annotated variants.
pub fn build_table<I>(
    variants: I,
    builder: &ResultBuilder,
) -> Result<(ResultTable, usize), anyhow::Error>
where
    I: IntoIterator<Item = Result<CohortVariant, anyhow::Error>>,
{
    let mut table = ResultTable::new();
    let mut skipped = 0;
    for variant in variants {
        let variant = variant?;
        match builder.process_variant(&variant)? {
            Some(result) => {
                table.insert(result.id.clone(), result);
            }
            None => {
                tracing::debug!("variant {} has no annotation, skipping", variant.id);
                skipped += 1;
            }
        }
    }
    Ok((table, skipped))
}

/// Add the Regenie results to the table, every Regenie variant must be in the table.
pub fn merge_regenie<I>(table: &mut ResultTable, records: I) -> Result<usize, anyhow::Error>
where
    I: IntoIterator<Item = Result<output::Record, anyhow::Error>>,
{
    let mut count = 0;
    for record in records {
        let record = record?;
        let result = table.get_mut(&record.id).ok_or_else(|| {
            anyhow::anyhow!(
                "variant {} of the Regenie output is not in the annotated VCF",
                record.id
            )
        })?;
        result.regenie = RegenieFields::from(&record);
        count += 1;
    }
    Ok(count)
}

/// Write the result table with its column descriptions.
pub fn write_table<W: Write>(writer: &mut W, table: &ResultTable) -> Result<(), anyhow::Error> {
    for (name, description) in TABLE_COLUMNS {
        writeln!(writer, "# {}: {}", name, description)?;
    }
    writeln!(writer, "{}", TABLE_COLUMNS.iter().map(|(name, _)| name).join(" "))?;
    for result in table.values() {
        writeln!(writer, "{}", result.table_row().join(" "))?;
    }
    Ok(())
}

/// Write the HiGlass variant file.
pub fn write_higlass<W: Write>(
    writer: &mut W,
    table: &ResultTable,
) -> Result<usize, anyhow::Error> {
    write_vcf_header(writer)?;
    let mut count = 0;
    for result in table.values().filter(|r| r.include_for_higlass) {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            result.chrom,
            result.pos,
            result.id,
            result.reference,
            result.alternative,
            HIGLASS_QUAL,
            HIGLASS_FILTER,
            result.higlass_info()
        )?;
        count += 1;
    }
    Ok(count)
}

/// Main entry point for `variants results` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);
    let config = ConfigBuilder::default()
        .csq_tag(args.csq_tag.as_str())
        .af_threshold_higlass(args.af_threshold_higlass)
        .build()?;

    let cohort = Cohort::from_arg(&args.sample_info)?;
    let source = VcfVariantSource::open(&args.path_input_vcf, &config.csq_tag)?;
    let schema = source.schema()?;
    let partition = Partition::new(&source.sample_names(), &cohort.case_ids())?;
    tracing::info!(
        "{} case and {} control samples",
        partition.cases.len(),
        partition.controls.len()
    );

    tracing::info!("Computing variant statistics ...");
    let start = Instant::now();
    let builder = ResultBuilder::new(config, &schema, partition)?;
    let (mut table, skipped) = build_table(source, &builder)?;
    tracing::info!(
        "... computed {} variants, skipped {} without annotation in {:?}",
        table.len(),
        skipped,
        start.elapsed()
    );

    let merged = merge_regenie(
        &mut table,
        output::Reader::from_path(&args.path_regenie_output, VARIANT_COLUMNS)?,
    )?;
    tracing::info!("merged Regenie results of {} variants", merged);

    let mut writer = open_write_maybe_gz(&args.path_output)?;
    write_table(&mut writer, &table)?;
    writer.flush()?;

    let mut higlass_writer = open_write_maybe_gz(&args.path_higlass_vcf)?;
    let count = write_higlass(&mut higlass_writer, &table)?;
    higlass_writer.flush()?;
    tracing::info!("wrote {} variants to HiGlass file", count);

    Ok(())
}
