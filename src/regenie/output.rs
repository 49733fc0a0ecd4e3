//! Reading of Regenie step 2 association output.
//!
//! The files are whitespace delimited, may be gzip compressed, carry `##` comment lines and
//! a header line starting with `CHROM`, e.g.
//!
//! ```text
//! CHROM GENPOS ID ALLELE0 ALLELE1 A1FREQ INFO N TEST BETA SE CHISQ LOG10P EXTRA
//! 1 13613 chr1_13613_T_A T A 0.0514706 1 68 ADD 0.191978 0.695341 0.0762264 0.106528 NA
//! ```

use std::io::BufRead;
use std::path::Path;

use crate::common::io::std::open_read_maybe_gz;

/// Column layout of variant level results.
pub const VARIANT_COLUMNS: &[&str] = &[
    "CHROM", "GENPOS", "ID", "ALLELE0", "ALLELE1", "A1FREQ", "INFO", "N", "TEST", "BETA", "SE",
    "CHISQ", "LOG10P", "EXTRA",
];

/// Column layout of gene level (mask) results.
pub const GENE_COLUMNS: &[&str] = &[
    "CHROM", "GENPOS", "ID", "ALLELE0", "ALLELE1", "A1FREQ", "N", "TEST", "BETA", "SE", "CHISQ",
    "LOG10P", "EXTRA",
];

/// Indices of the columns that are used downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub id: usize,
    pub test: usize,
    pub beta: usize,
    pub se: usize,
    pub chisq: usize,
    pub log10p: usize,
}

impl Columns {
    /// Locate the columns by their header names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, anyhow::Error> {
        let find = |name: &str| {
            names
                .iter()
                .position(|n| n.as_ref() == name)
                .ok_or_else(|| anyhow::anyhow!("column {} missing from Regenie output", name))
        };
        Ok(Self {
            id: find("ID")?,
            test: find("TEST")?,
            beta: find("BETA")?,
            se: find("SE")?,
            chisq: find("CHISQ")?,
            log10p: find("LOG10P")?,
        })
    }

    fn max(&self) -> usize {
        [
            self.id,
            self.test,
            self.beta,
            self.se,
            self.chisq,
            self.log10p,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
    }
}

/// One result line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub id: String,
    pub test: String,
    pub beta: String,
    pub se: String,
    pub chisq: String,
    pub log10p: String,
}

impl Record {
    fn parse(line: &str, columns: &Columns) -> Result<Self, anyhow::Error> {
        let fields = line.split_whitespace().collect::<Vec<_>>();
        if fields.len() <= columns.max() {
            anyhow::bail!(
                "Regenie output line has {} columns, expected at least {}: {}",
                fields.len(),
                columns.max() + 1,
                line
            );
        }
        Ok(Self {
            id: fields[columns.id].to_string(),
            test: fields[columns.test].to_string(),
            beta: fields[columns.beta].to_string(),
            se: fields[columns.se].to_string(),
            chisq: fields[columns.chisq].to_string(),
            log10p: fields[columns.log10p].to_string(),
        })
    }
}

/// Streaming reader of result lines.
pub struct Reader<R: BufRead> {
    inner: R,
    columns: Columns,
    line: String,
}

impl Reader<Box<dyn BufRead>> {
    /// Open the file at `path`, using `default_layout` until a `CHROM` header line is seen.
    pub fn from_path<P>(path: P, default_layout: &[&str]) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        Self::new(open_read_maybe_gz(path)?, default_layout)
    }
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R, default_layout: &[&str]) -> Result<Self, anyhow::Error> {
        Ok(Self {
            inner,
            columns: Columns::from_names(default_layout)?,
            line: String::new(),
        })
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Read the next record, `None` at the end of the file.
    pub fn read_record(&mut self) -> Result<Option<Record>, anyhow::Error> {
        loop {
            self.line.clear();
            if self.inner.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let line = self.line.trim();
            if line.is_empty() || line.starts_with("##") {
                continue;
            } else if line.starts_with("CHROM") {
                let names = line.split_whitespace().collect::<Vec<_>>();
                self.columns = Columns::from_names(&names)?;
                continue;
            }
            return Record::parse(line, &self.columns).map(Some);
        }
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result<Record, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_layouts() -> Result<(), anyhow::Error> {
        let variant = Columns::from_names(VARIANT_COLUMNS)?;
        assert_eq!((variant.id, variant.test, variant.log10p), (2, 8, 12));

        let gene = Columns::from_names(GENE_COLUMNS)?;
        assert_eq!((gene.id, gene.test, gene.log10p), (2, 7, 11));

        assert!(Columns::from_names(&["CHROM", "ID"]).is_err());

        Ok(())
    }

    #[test]
    fn read_without_header() -> Result<(), anyhow::Error> {
        let text = "##comment\n\
            1 13613 chr1_13613_T_A T A 0.0514706 1 68 ADD 0.191978 0.695341 0.0762264 0.106528 NA\n";
        let records =
            Reader::new(text.as_bytes(), VARIANT_COLUMNS)?.collect::<Result<Vec<_>, _>>()?;

        assert_eq!(
            records,
            vec![Record {
                id: String::from("chr1_13613_T_A"),
                test: String::from("ADD"),
                beta: String::from("0.191978"),
                se: String::from("0.695341"),
                chisq: String::from("0.0762264"),
                log10p: String::from("0.106528"),
            }]
        );

        Ok(())
    }

    #[test]
    fn read_uses_header_layout() -> Result<(), anyhow::Error> {
        // gene level layout without INFO column, read with the variant level default
        let text = "CHROM GENPOS ID ALLELE0 ALLELE1 A1FREQ N TEST BETA SE CHISQ LOG10P EXTRA\n\
            1 169859186 ENSG00000000457.mask_cadd.all ref mask_cadd.all NA 67 ADD-ACATO NA NA 2.73635 1.00838 NA\n";
        let mut reader = Reader::new(text.as_bytes(), VARIANT_COLUMNS)?;
        let record = reader.read_record()?.unwrap_or_default();

        assert_eq!(record.id, "ENSG00000000457.mask_cadd.all");
        assert_eq!(record.test, "ADD-ACATO");
        assert_eq!(record.log10p, "1.00838");
        assert_eq!(reader.read_record()?, None);

        Ok(())
    }

    #[test]
    fn read_short_line() -> Result<(), anyhow::Error> {
        let mut reader = Reader::new("1 100 id\n".as_bytes(), VARIANT_COLUMNS)?;
        assert!(reader.read_record().is_err());

        Ok(())
    }

    #[test]
    fn from_path_gz() -> Result<(), anyhow::Error> {
        let records = Reader::from_path("tests/data/regenie/genes.regenie.gz", GENE_COLUMNS)?
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records.len(), 6);

        Ok(())
    }
}
