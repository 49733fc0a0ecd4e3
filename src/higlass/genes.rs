//! Conversion of gene level Regenie results into a VCF-like file for HiGlass.

use std::io::{BufRead, Write};
use std::path::Path;

use clap::Parser;
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use super::{write_vcf_header, HIGLASS_FILTER, HIGLASS_QUAL};
use crate::common::io::std::{open_read_maybe_gz, open_write_maybe_gz};
use crate::regenie::output::{self, GENE_COLUMNS};

/// Command line arguments for `higlass genes` sub command.
#[derive(Parser, Debug)]
#[command(about = "Create HiGlass gene file from Regenie gene results", long_about = None)]
pub struct Args {
    /// Path to the gene level Regenie output.
    #[arg(long)]
    pub path_regenie_output: String,
    /// Path to the Regenie mask SNP list (`<mask id>\t<variants>`).
    #[arg(long)]
    pub path_snp_list: String,
    /// Path to the gene info TSV (`ens_id chr start end strand gene`).
    #[arg(long)]
    pub path_gene_info: String,
    /// Allele frequency bin to report, `1` for all variants of a mask.
    #[arg(long)]
    pub aaf_bin: String,
    /// Path to the output file.
    #[arg(long)]
    pub path_output: String,
}

/// Row of the gene info TSV.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneInfo {
    pub ens_id: String,
    pub chrom: String,
    pub start: String,
    pub end: String,
    pub strand: String,
    pub symbol: String,
}

/// Load gene info keyed by Ensembl gene ID, skipping the header line if present.
pub fn load_gene_info<P>(path: P) -> Result<IndexMap<String, GeneInfo>, anyhow::Error>
where
    P: AsRef<Path>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(open_read_maybe_gz(path.as_ref())?);
    let mut genes = IndexMap::new();
    for result in rdr.deserialize() {
        let gene: GeneInfo = result.map_err(|e| {
            anyhow::anyhow!(
                "could not parse gene info {}: {}",
                path.as_ref().display(),
                e
            )
        })?;
        if gene.ens_id == "ens_id" {
            continue;
        }
        genes.insert(gene.ens_id.clone(), gene);
    }
    Ok(genes)
}

/// Whether a mask ID matches the requested allele frequency bin.
fn in_aaf_bin(mask_id: &str, aaf_bin: &str) -> bool {
    if aaf_bin == "1" {
        mask_id.ends_with("all")
    } else {
        mask_id.ends_with(aaf_bin)
    }
}

/// Split a Regenie mask ID `<gene>.<mask>.<bin>` into gene and mask.
fn split_mask_id(mask_id: &str) -> Option<(&str, &str)> {
    let mut parts = mask_id.split('.');
    Some((parts.next()?, parts.next()?))
}

/// Load the `INFO` entries listing the variants of each mask, by gene.
pub fn load_mask_snps<R: BufRead>(
    reader: R,
    aaf_bin: &str,
) -> Result<IndexMap<String, String>, anyhow::Error> {
    let mut snps_by_gene: IndexMap<String, String> = IndexMap::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (mask_id, snps) = line
            .split_once('\t')
            .ok_or_else(|| anyhow::anyhow!("invalid SNP list line: {:?}", line))?;
        if aaf_bin != "1" && !mask_id.ends_with(aaf_bin) {
            continue;
        }
        let (gene_id, mask) = split_mask_id(mask_id)
            .ok_or_else(|| anyhow::anyhow!("invalid mask ID in SNP list: {:?}", mask_id))?;
        snps_by_gene
            .entry(gene_id.to_string())
            .or_default()
            .push_str(&format!("{}_SNPS={};", mask.to_uppercase(), snps));
    }
    Ok(snps_by_gene)
}

/// Name of the test as reported in the output, `None` for unsupported tests.
fn test_name(regenie_test: &str) -> Option<&str> {
    if let Some(rest) = regenie_test.strip_prefix("ADD-") {
        rest.split('-').next()
    } else if regenie_test == "ADD" {
        Some("BURDEN")
    } else {
        None
    }
}

/// -log10(p) values by gene, mask, and test.
pub type GeneResults = IndexMap<String, IndexMap<String, IndexMap<String, String>>>;

/// Collect the Regenie gene results of annotated genes in the requested bin.
pub fn collect_results<I>(
    records: I,
    genes: &IndexMap<String, GeneInfo>,
    aaf_bin: &str,
) -> Result<GeneResults, anyhow::Error>
where
    I: IntoIterator<Item = Result<output::Record, anyhow::Error>>,
{
    let mut results = GeneResults::new();
    let mut unannotated = IndexSet::new();
    for record in records {
        let record = record?;
        let (gene_id, mask) = split_mask_id(&record.id)
            .ok_or_else(|| anyhow::anyhow!("invalid Regenie mask ID: {:?}", record.id))?;

        if unannotated.contains(gene_id) {
            continue;
        }
        if !genes.contains_key(gene_id) {
            tracing::warn!("{} not found in gene info, skipping", gene_id);
            unannotated.insert(gene_id.to_string());
            continue;
        }
        let Some(test) = test_name(&record.test) else {
            tracing::warn!("Regenie test {} not recognized", record.test);
            continue;
        };
        if !in_aaf_bin(&record.id, aaf_bin) {
            continue;
        }

        results
            .entry(gene_id.to_string())
            .or_default()
            .entry(mask.to_string())
            .or_default()
            .insert(test.to_string(), record.log10p.clone());
    }
    Ok(results)
}

/// Write one line per gene with results.
pub fn write_genes<W: Write>(
    writer: &mut W,
    results: &GeneResults,
    genes: &IndexMap<String, GeneInfo>,
    mask_snps: &IndexMap<String, String>,
) -> Result<(), anyhow::Error> {
    write_vcf_header(writer)?;
    for (gene_id, masks) in results {
        let Some(gene) = genes.get(gene_id) else {
            continue;
        };
        let mut info = format!("END={};SYMBOL={};", gene.end, gene.symbol);
        for (mask, tests) in masks {
            for (test, log10p) in tests {
                info.push_str(&format!("{}_{}={};", mask.to_uppercase(), test, log10p));
            }
        }
        if let Some(snps) = mask_snps.get(gene_id) {
            info.push_str(snps);
        }
        writeln!(
            writer,
            "chr{}\t{}\t{}\t.\t.\t{}\t{}\t{}",
            gene.chrom, gene.start, gene_id, HIGLASS_QUAL, HIGLASS_FILTER, info
        )?;
    }
    Ok(())
}

/// Main entry point for `higlass genes` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let genes = load_gene_info(&args.path_gene_info)?;
    tracing::info!("loaded info of {} genes", genes.len());
    let mask_snps = load_mask_snps(open_read_maybe_gz(&args.path_snp_list)?, &args.aaf_bin)?;
    let reader = output::Reader::from_path(&args.path_regenie_output, GENE_COLUMNS)?;
    let results = collect_results(reader, &genes, &args.aaf_bin)?;

    let mut writer = open_write_maybe_gz(&args.path_output)?;
    write_genes(&mut writer, &results, &genes, &mask_snps)?;
    writer.flush()?;

    tracing::info!("... wrote results of {} genes", results.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[rstest::rstest]
    #[case("ADD", Some("BURDEN"))]
    #[case("ADD-ACATO", Some("ACATO"))]
    #[case("ADD-SKATO-ACAT", Some("SKATO"))]
    #[case("DOM", None)]
    fn test_name(#[case] regenie_test: &str, #[case] expected: Option<&str>) {
        assert_eq!(super::test_name(regenie_test), expected);
    }

    #[rstest::rstest]
    #[case("G.mask_cadd.all", "1", true)]
    #[case("G.mask_cadd.0.01", "1", false)]
    #[case("G.mask_cadd.0.01", "0.01", true)]
    #[case("G.mask_cadd.all", "0.01", false)]
    fn in_aaf_bin(#[case] mask_id: &str, #[case] aaf_bin: &str, #[case] expected: bool) {
        assert_eq!(super::in_aaf_bin(mask_id, aaf_bin), expected);
    }

    #[test]
    fn load_gene_info() -> Result<(), anyhow::Error> {
        let genes = super::load_gene_info("tests/data/higlass/gene_info.tsv")?;

        assert_eq!(genes.len(), 2);
        assert_eq!(
            genes.get("ENSG01").map(|g| g.symbol.as_str()),
            Some("GENE1")
        );

        Ok(())
    }

    #[test]
    fn load_mask_snps() -> Result<(), anyhow::Error> {
        let text = "ENSG01.mask_cadd.0.01\tv1,v2\nENSG01.mask_missense.all\tv1\n";

        let all = super::load_mask_snps(text.as_bytes(), "1")?;
        assert_eq!(
            all.get("ENSG01").map(String::as_str),
            Some("MASK_CADD_SNPS=v1,v2;MASK_MISSENSE_SNPS=v1;")
        );

        let bin = super::load_mask_snps(text.as_bytes(), "0.01")?;
        assert_eq!(
            bin.get("ENSG01").map(String::as_str),
            Some("MASK_CADD_SNPS=v1,v2;")
        );

        Ok(())
    }

    #[test]
    fn run_smoke() -> Result<(), anyhow::Error> {
        let temp = temp_testdir::TempDir::default();
        let path_output = temp.join("higlass_genes.vcf");
        let args = Args {
            path_regenie_output: String::from("tests/data/regenie/genes.regenie.gz"),
            path_snp_list: String::from("tests/data/regenie/masks.snplist.gz"),
            path_gene_info: String::from("tests/data/higlass/gene_info.tsv"),
            aaf_bin: String::from("1"),
            path_output: path_output.to_string_lossy().to_string(),
        };

        run(&crate::common::Args::default(), &args)?;

        assert_eq!(
            std::fs::read_to_string(&path_output)?,
            "##fileformat=VCFv4.3\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             chr1\t900\tENSG01\t.\t.\t0\tPASS\tEND=2500;SYMBOL=GENE1;\
             MASK_CADD_BURDEN=1.2;MASK_CADD_ACATO=2.73635;MASK_MISSENSE_BURDEN=NA;\
             MASK_CADD_SNPS=chr1_1000_G_A;MASK_MISSENSE_SNPS=chr1_1000_G_A,chr1_2000_C_T;\n"
        );

        Ok(())
    }
}
