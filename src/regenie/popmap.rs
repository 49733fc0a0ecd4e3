//! Creation of the population map used by the Hardy-Weinberg equilibrium filter.

use std::io::Write;

use clap::Parser;

use crate::common::io::std::open_write_maybe_gz;
use crate::samples::Cohort;

/// Command line arguments for `regenie popmap` sub command.
#[derive(Parser, Debug)]
#[command(about = "Create sample to ancestry map", long_about = None)]
pub struct Args {
    /// Sample information as JSON, or `@path` of a JSON file.
    #[arg(long)]
    pub sample_info: String,
    /// Path to the popmap file to write.
    #[arg(long)]
    pub path_output: String,
}

/// Text of an unknown ancestry.
const NO_ANCESTRY: &str = "None";

/// Write one `<sample>\t<ancestry>` line per sample.
pub fn write_popmap<W: Write>(cohort: &Cohort, writer: &mut W) -> Result<(), anyhow::Error> {
    for sample in cohort.samples.values() {
        writeln!(
            writer,
            "{}\t{}",
            sample.sample_id,
            sample.ancestry.as_deref().unwrap_or(NO_ANCESTRY)
        )?;
    }
    Ok(())
}

/// Main entry point for `regenie popmap` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let cohort = Cohort::from_arg(&args.sample_info)?;
    let mut writer = open_write_maybe_gz(&args.path_output)?;
    write_popmap(&cohort, &mut writer)?;
    writer.flush()?;
    tracing::info!("... wrote ancestry of {} samples", cohort.samples.len());
    Ok(())
}
