//! Hard filtering of jointly called variants with the GATK best practice thresholds.
//!
//! - SNPs: `QD > 2.0`, `FS < 60`, `MQRankSum > -12.5`, `ReadPosRankSum > -8.0`, `SOR <= 3`,
//!   `InbreedingCoeff > -0.8`
//! - indels: `QD > 2.0`, `FS < 200`, `ReadPosRankSum > -20.0`, `SOR <= 10`
//!
//! Variants lacking any of the annotations are excluded.

use std::io::Write as _;
use std::time::Instant;

use clap::Parser;
use noodles::vcf;
use noodles::vcf::variant::io::Write as _;
use noodles::vcf::variant::RecordBuf;

use crate::common::noodles::{
    info_float, open_vcf_reader, open_vcf_writer, record_alt, record_id, VcfReader, VcfWriter,
};

/// Command line arguments for `filter gatk` sub command.
#[derive(Parser, Debug)]
#[command(about = "Apply GATK best practice hard filters", long_about = None)]
pub struct Args {
    /// Path to the jointly called VCF.
    #[arg(long)]
    pub path_input_vcf: String,
    /// Path to the filtered VCF, bgzip compressed if ending in `.gz`.
    #[arg(long)]
    pub path_output_vcf: String,
    /// Stop after this many input records.
    #[arg(long)]
    pub max_var_count: Option<usize>,
}

/// Thresholds of the filter.
#[derive(Debug, Clone, PartialEq, derive_builder::Builder)]
#[builder(pattern = "immutable")]
pub struct Config {
    /// SNPs pass with `FS` below.
    #[builder(default = "60.0")]
    pub fs_snp: f64,
    /// Indels pass with `FS` below.
    #[builder(default = "200.0")]
    pub fs_indel: f64,
    /// SNPs pass with `InbreedingCoeff` above.
    #[builder(default = "-0.8")]
    pub inbreeding: f64,
    /// SNPs pass with `MQRankSum` above.
    #[builder(default = "-12.5")]
    pub mq_rank_sum: f64,
    /// Variants pass with `QD` above.
    #[builder(default = "2.0")]
    pub qd: f64,
    /// SNPs pass with `ReadPosRankSum` above.
    #[builder(default = "-8.0")]
    pub read_pos_rank_sum_snp: f64,
    /// Indels pass with `ReadPosRankSum` above.
    #[builder(default = "-20.0")]
    pub read_pos_rank_sum_indel: f64,
    /// SNPs pass with `SOR` up to.
    #[builder(default = "3.0")]
    pub sor_snp: f64,
    /// Indels pass with `SOR` up to.
    #[builder(default = "10.0")]
    pub sor_indel: f64,
}

/// Site annotations the filter looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteMetrics {
    pub fs: f64,
    pub inbreeding: f64,
    pub mq_rank_sum: f64,
    pub qd: f64,
    pub read_pos_rank_sum: f64,
    pub sor: f64,
}

impl SiteMetrics {
    /// Extract from the INFO column, `None` if any value is missing.
    pub fn from_record(record: &RecordBuf) -> Option<Self> {
        Some(Self {
            fs: info_float(record, "FS")?,
            inbreeding: info_float(record, "InbreedingCoeff")?,
            mq_rank_sum: info_float(record, "MQRankSum")?,
            qd: info_float(record, "QD")?,
            read_pos_rank_sum: info_float(record, "ReadPosRankSum")?,
            sor: info_float(record, "SOR")?,
        })
    }
}

impl Config {
    /// Whether a site passes the filter.
    pub fn passes(&self, is_indel: bool, m: &SiteMetrics) -> bool {
        if is_indel {
            m.fs < self.fs_indel
                && m.qd > self.qd
                && m.read_pos_rank_sum > self.read_pos_rank_sum_indel
                && m.sor <= self.sor_indel
        } else {
            m.fs < self.fs_snp
                && m.inbreeding > self.inbreeding
                && m.mq_rank_sum > self.mq_rank_sum
                && m.qd > self.qd
                && m.read_pos_rank_sum > self.read_pos_rank_sum_snp
                && m.sor <= self.sor_snp
        }
    }
}

/// Counts of a filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterStats {
    pub total: usize,
    pub excluded: usize,
    /// Excluded because of missing annotations.
    pub missing_tags: usize,
}

impl FilterStats {
    pub fn written(&self) -> usize {
        self.total - self.excluded
    }
}

/// Replace spanning deletion alleles `*` by `-` in the ALT and ID columns.
pub fn replace_star_alleles(record: &mut RecordBuf) {
    for alt in record.alternate_bases_mut().as_mut().iter_mut() {
        *alt = alt.replace('*', "-");
    }
    let ids = record.ids_mut().as_mut();
    *ids = ids.iter().map(|id| id.replace('*', "-")).collect();
}

/// Whether a record is an indel rather than a SNP.
fn is_indel(record: &RecordBuf) -> bool {
    record.reference_bases().len() > 1 || record_alt(record).len() > 1
}

/// Filter all records of `reader` into `writer`.
pub fn filter_vcf(
    reader: &mut VcfReader,
    header: &vcf::Header,
    writer: &mut VcfWriter,
    config: &Config,
    max_var_count: Option<usize>,
) -> Result<FilterStats, anyhow::Error> {
    let mut stats = FilterStats::default();
    let mut record = RecordBuf::default();
    while reader.read_record_buf(header, &mut record)? != 0 {
        stats.total += 1;

        match SiteMetrics::from_record(&record) {
            Some(metrics) => {
                replace_star_alleles(&mut record);
                if config.passes(is_indel(&record), &metrics) {
                    writer
                        .write_variant_record(header, &record)
                        .map_err(|e| {
                            anyhow::anyhow!(
                                "could not write variant {}: {}",
                                record_id(&record),
                                e
                            )
                        })?;
                } else {
                    stats.excluded += 1;
                }
            }
            None => {
                tracing::trace!("variant {} lacks filter annotations", record_id(&record));
                stats.missing_tags += 1;
                stats.excluded += 1;
            }
        }

        if let Some(max_var_count) = max_var_count {
            if stats.total >= max_var_count {
                tracing::warn!(
                    "Stopping after {} records as requested by --max-var-count",
                    stats.total
                );
                break;
            }
        }
    }
    Ok(stats)
}

/// Main entry point for `filter gatk` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);
    let config = ConfigBuilder::default().build()?;
    tracing::info!(
        "SNP filtering: FS < {}, InbreedingCoeff > {}, MQRankSum > {}, QD > {}, \
        ReadPosRankSum > {}, SOR <= {}",
        config.fs_snp,
        config.inbreeding,
        config.mq_rank_sum,
        config.qd,
        config.read_pos_rank_sum_snp,
        config.sor_snp
    );
    tracing::info!(
        "INDEL filtering: FS < {}, QD > {}, ReadPosRankSum > {}, SOR <= {}",
        config.fs_indel,
        config.qd,
        config.read_pos_rank_sum_indel,
        config.sor_indel
    );

    let start = Instant::now();
    let mut reader = open_vcf_reader(&args.path_input_vcf)?;
    let header = reader.read_header()?;
    let mut writer = open_vcf_writer(&args.path_output_vcf)?;
    writer.write_header(&header)?;

    let stats = filter_vcf(
        &mut reader,
        &header,
        &mut writer,
        &config,
        args.max_var_count,
    )?;
    writer.get_mut().flush()?;

    tracing::info!("Original number of variants: {}", stats.total);
    tracing::info!(
        "Variants excluded: {}. {} of those had missing tags.",
        stats.excluded,
        stats.missing_tags
    );
    tracing::info!("New number of variants: {}", stats.written());
    crate::common::trace_elapsed("filtered", stats.total, start);
    Ok(())
}
