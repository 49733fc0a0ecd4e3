//! VCF-like text files for display in the HiGlass genome browser.

use std::io::Write;

pub mod genes;

/// Version line of all HiGlass files.
pub const HIGLASS_FILE_FORMAT: &str = "##fileformat=VCFv4.3";

/// Column header of all HiGlass files.
pub const HIGLASS_COLUMNS: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO";

pub const HIGLASS_QUAL: &str = "0";
pub const HIGLASS_FILTER: &str = "PASS";

/// Write the two header lines of a HiGlass file.
pub fn write_vcf_header<W: Write>(writer: &mut W) -> Result<(), anyhow::Error> {
    writeln!(writer, "{}", HIGLASS_FILE_FORMAT)?;
    writeln!(writer, "{}", HIGLASS_COLUMNS)?;
    Ok(())
}
