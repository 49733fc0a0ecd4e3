//! Creation of the Regenie phenotype file from a BGEN sample file.

use std::io::{BufRead, Write};

use clap::Parser;

use crate::common::io::std::{open_read_maybe_gz, open_write_maybe_gz};

/// Command line arguments for `regenie phenotype` sub command.
#[derive(Parser, Debug)]
#[command(about = "Create Regenie binary phenotype file", long_about = None)]
pub struct Args {
    /// Path to the BGEN sample file.
    #[arg(long)]
    pub path_sample_file: String,
    /// Comma separated IDs of the affected samples.
    #[arg(long, value_delimiter = ',')]
    pub cases: Vec<String>,
    /// Path to the phenotype file to write.
    #[arg(long)]
    pub path_output: String,
}

/// Header of the phenotype file.
pub const HEADER: &str = "FID IID Y1";

/// Number of header lines of a BGEN sample file (column names and column types).
const SAMPLE_FILE_HEADER_LINES: usize = 2;

/// Write one `FID IID Y1` line per sample of the BGEN sample file, `Y1` being `1` for cases.
pub fn write_phenotypes<R, W>(
    reader: R,
    writer: &mut W,
    cases: &[String],
) -> Result<usize, anyhow::Error>
where
    R: BufRead,
    W: Write,
{
    writeln!(writer, "{}", HEADER)?;
    let mut count = 0;
    for line in reader.lines().skip(SAMPLE_FILE_HEADER_LINES) {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (Some(fid), Some(iid)) = (fields.next(), fields.next()) else {
            anyhow::bail!("invalid line in BGEN sample file: {:?}", line);
        };
        let status = if cases.iter().any(|c| c == iid) { "1" } else { "0" };
        writeln!(writer, "{} {} {}", fid, iid, status)?;
        count += 1;
    }
    Ok(count)
}

/// Main entry point for `regenie phenotype` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);
    let reader = open_read_maybe_gz(&args.path_sample_file)?;
    let mut writer = open_write_maybe_gz(&args.path_output)?;
    let count = write_phenotypes(reader, &mut writer, &args.cases)?;
    writer.flush()?;
    tracing::info!("... wrote phenotypes of {} samples", count);
    Ok(())
}

#[cfg(test)]
mod test {
    use clap_verbosity_flag::Verbosity;
    use pretty_assertions::assert_eq;
    use temp_testdir::TempDir;

    use super::*;

    #[test]
    fn write_phenotypes_marks_cases() -> Result<(), anyhow::Error> {
        let input = "ID_1 ID_2 missing\n0 0 0\nf1 a 0\nf2 b 0\n";
        let mut buf = Vec::new();
        let count = write_phenotypes(input.as_bytes(), &mut buf, &[String::from("b")])?;

        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(buf)?, "FID IID Y1\nf1 a 0\nf2 b 1\n");

        Ok(())
    }

    #[test]
    fn write_phenotypes_invalid_line() {
        let input = "ID_1 ID_2 missing\n0 0 0\nlonely\n";
        let mut buf = Vec::new();
        assert!(write_phenotypes(input.as_bytes(), &mut buf, &[]).is_err());
    }

    #[test]
    fn run_smoke() -> Result<(), anyhow::Error> {
        let temp = TempDir::default();
        let path_output = temp.join("cohort.phenotype");
        let args_common = crate::common::Args {
            verbose: Verbosity::new(0, 0),
        };
        let args = Args {
            path_sample_file: String::from("tests/data/samples/bgen.sample"),
            cases: vec![String::from("s1"), String::from("s3")],
            path_output: path_output.to_string_lossy().to_string(),
        };

        run(&args_common, &args)?;

        assert_eq!(
            std::fs::read_to_string(&path_output)?,
            "FID IID Y1\nfam1 s1 1\nfam2 s2 0\nfam3 s3 1\n"
        );

        Ok(())
    }
}
