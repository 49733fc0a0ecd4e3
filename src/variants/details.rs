//! Per-variant list of the carrier samples for HiGlass.

use std::io::Write;
use std::time::Instant;

use clap::Parser;
use noodles::vcf;

use crate::annotate::DEFAULT_CSQ_TAG;
use crate::common::io::std::open_write_maybe_gz;
use crate::higlass::{HIGLASS_FILTER, HIGLASS_QUAL};
use crate::samples::{Cohort, SampleInfo};
use crate::stats::genotypes::is_carrier;
use crate::variants::source::{CohortVariant, VcfVariantSource};

/// Command line arguments for `variants details` sub command.
#[derive(Parser, Debug)]
#[command(
    about = "Create HiGlass file with the carrier samples of each variant",
    long_about = None
)]
pub struct Args {
    /// Path to the annotated, jointly called VCF.
    #[arg(long)]
    pub path_input_vcf: String,
    /// Sample information as JSON, or `@path` of a JSON file.
    #[arg(long)]
    pub sample_info: String,
    /// Path to the output file.
    #[arg(long)]
    pub path_output: String,
}

/// Python style text of a boolean.
fn bool_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Text of a missing portal link.
const NO_LINKTO_ID: &str = "None";

/// Entry `sample:linkto_id:is_affected:tissue_type:contact` of one carrier.
///
/// A missing tissue or contact is left empty.
fn carrier_entry(info: &SampleInfo) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        info.sample_id,
        info.linkto_id.as_deref().unwrap_or(NO_LINKTO_ID),
        bool_text(info.is_affected),
        info.tissue_type.as_deref().unwrap_or_default(),
        info.contact.as_deref().unwrap_or_default(),
    )
}

/// Resolves the VCF samples against the cohort metadata once.
pub struct CarrierLookup {
    samples: Vec<SampleInfo>,
}

impl CarrierLookup {
    /// Fails if a VCF sample has no metadata.
    pub fn new<S: AsRef<str>>(vcf_samples: &[S], cohort: &Cohort) -> Result<Self, anyhow::Error> {
        let samples = vcf_samples
            .iter()
            .map(|name| {
                cohort.get(name.as_ref()).cloned().ok_or_else(|| {
                    anyhow::anyhow!("sample {} of the VCF is not in the sample info", name.as_ref())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { samples })
    }

    /// The `samples=` INFO value of a variant, every carrier followed by a comma.
    pub fn info(&self, variant: &CohortVariant) -> String {
        let mut info = String::from("samples=");
        for (gt, sample) in variant.genotypes.iter().zip(&self.samples) {
            if is_carrier(gt) {
                info.push_str(&carrier_entry(sample));
                info.push(',');
            }
        }
        info
    }
}

/// Write the header of the input VCF and the details line of each variant.
///
/// Returns the number of variants.
pub fn write_details<I, W>(
    header: &vcf::Header,
    variants: I,
    lookup: &CarrierLookup,
    writer: &mut W,
) -> Result<usize, anyhow::Error>
where
    I: IntoIterator<Item = Result<CohortVariant, anyhow::Error>>,
    W: Write,
{
    vcf::io::Writer::new(&mut *writer).write_header(header)?;
    let mut count = 0;
    for variant in variants {
        let variant = variant?;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            variant.chrom,
            variant.pos,
            variant.id,
            variant.reference,
            variant.alternative,
            HIGLASS_QUAL,
            HIGLASS_FILTER,
            lookup.info(&variant)
        )?;
        count += 1;
    }
    Ok(count)
}

/// Main entry point for `variants details` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let cohort = Cohort::from_arg(&args.sample_info)?;
    let source = VcfVariantSource::open(&args.path_input_vcf, DEFAULT_CSQ_TAG)?;
    let lookup = CarrierLookup::new(&source.sample_names(), &cohort)?;
    let header = source.header().clone();

    tracing::info!("Writing variant details ...");
    let start = Instant::now();
    let mut writer = open_write_maybe_gz(&args.path_output)?;
    let count = write_details(&header, source, &lookup, &mut writer)?;
    writer.flush()?;
    tracing::info!("... wrote {} variants in {:?}", count, start.elapsed());

    Ok(())
}
