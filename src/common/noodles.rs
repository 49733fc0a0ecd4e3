//! Helper code for using noodles.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use noodles::vcf;
use noodles::vcf::variant::record::samples::series::value::genotype::Phasing;
use noodles::vcf::variant::record_buf::info::field::{value::Array, Value as InfoValue};
use noodles::vcf::variant::record_buf::samples::sample::value::Genotype;
use noodles::vcf::variant::record_buf::samples::sample::Value as SampleValue;
use noodles::vcf::variant::RecordBuf;

use crate::common::io::std::is_gz;

/// Alias for the VCF reader type that we will use.
pub type VcfReader = vcf::io::Reader<Box<dyn BufRead>>;

/// Alias for the VCF writer type that we will use.
pub type VcfWriter = vcf::io::Writer<Box<dyn Write>>;

/// Helper function that opens one VCF reader at the given path.
///
/// Plain text and bgzip compressed files are supported.
pub fn open_vcf_reader<P>(path: P) -> Result<VcfReader, anyhow::Error>
where
    P: AsRef<Path>,
{
    tracing::trace!("Opening {:?} as VCF for reading", path.as_ref());
    vcf::io::reader::Builder::default()
        .build_from_path(path.as_ref())
        .map_err(|e| {
            anyhow::anyhow!(
                "could not build VCF reader for {}: {}",
                path.as_ref().display(),
                e
            )
        })
}

/// Helper function that opens one VCF writer at the given path.
///
/// Files ending in `.gz` or `.bgz` are written with bgzip compression.
pub fn open_vcf_writer<P>(path: P) -> Result<VcfWriter, anyhow::Error>
where
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref()).map_err(|e| {
        anyhow::anyhow!(
            "could not build VCF writer for {}: {}",
            path.as_ref().display(),
            e
        )
    })?;
    let inner: Box<dyn Write> = if is_gz(path.as_ref()) {
        tracing::trace!("Opening {:?} as bgzip VCF for writing", path.as_ref());
        Box::new(noodles::bgzf::io::Writer::new(file))
    } else {
        tracing::trace!("Opening {:?} as plain VCF for writing", path.as_ref());
        Box::new(BufWriter::new(file))
    };
    Ok(vcf::io::Writer::new(inner))
}

/// Render a `GT` value as it is written in the file.
///
/// The leading phasing marker that noodles records for the first allele is dropped for all
/// file format versions, so `0/1` is returned as `0/1` and never as `/0/1`.
pub fn genotype_string(gt: &Genotype) -> String {
    let gt = gt
        .as_ref()
        .iter()
        .map(|allele| {
            let pos = allele.position();
            let pos = pos.map(|p| format!("{}", p)).unwrap_or(".".to_string());
            let phase = match allele.phasing() {
                Phasing::Phased => "|",
                Phasing::Unphased => "/",
            };
            (phase, pos)
        })
        .fold(String::new(), |mut a, (phase, pos)| {
            a.push_str(phase);
            a.push_str(&pos);
            a
        });

    match gt.strip_prefix(['/', '|']) {
        Some(stripped) => stripped.to_string(),
        None => gt,
    }
}

/// Return the `GT` value of the sample at `sample_idx` as a string.
///
/// A missing value is rendered as `"."`, `None` is returned if the sample has no `GT` key.
pub fn sample_genotype(record: &RecordBuf, sample_idx: usize) -> Option<String> {
    let value = record
        .samples()
        .get_index(sample_idx)
        .and_then(|sample| sample.get("GT").map(|value| value.cloned()))?;
    Some(match value {
        Some(SampleValue::Genotype(gt)) => genotype_string(&gt),
        Some(SampleValue::String(s)) => s,
        Some(_) | None => String::from("."),
    })
}

/// Return the INFO value with the given key rendered as VCF text.
///
/// Multi-valued (`Number=.`) string fields are joined with `,` as they appear in the file.
pub fn info_string(record: &RecordBuf, key: &str) -> Option<String> {
    match record.info().get(key) {
        Some(Some(InfoValue::String(value))) => Some(value.clone()),
        Some(Some(InfoValue::Array(Array::String(values)))) => Some(
            values
                .iter()
                .map(|value| value.as_deref().unwrap_or("."))
                .join(","),
        ),
        Some(Some(InfoValue::Integer(value))) => Some(value.to_string()),
        Some(Some(InfoValue::Float(value))) => Some(value.to_string()),
        _ => None,
    }
}

/// Return the INFO value with the given key as a floating point number.
pub fn info_float(record: &RecordBuf, key: &str) -> Option<f64> {
    match record.info().get(key) {
        Some(Some(InfoValue::Float(value))) => Some(f64::from(*value)),
        Some(Some(InfoValue::Integer(value))) => Some(f64::from(*value)),
        Some(Some(InfoValue::String(value))) => value.parse().ok(),
        Some(Some(InfoValue::Array(Array::Float(values)))) => {
            values.first().copied().flatten().map(f64::from)
        }
        _ => None,
    }
}

/// Return the IDs of the record joined with `;`, or `"."` if there are none.
pub fn record_id(record: &RecordBuf) -> String {
    let ids = record.ids().as_ref();
    if ids.is_empty() {
        String::from(".")
    } else {
        ids.iter().join(";")
    }
}

/// Return the alternate alleles of the record joined with `,`.
pub fn record_alt(record: &RecordBuf) -> String {
    let alts: &[String] = record.alternate_bases().as_ref();
    if alts.is_empty() {
        String::from(".")
    } else {
        alts.iter().join(",")
    }
}

/// Return the 1-based start position of the record, 0 if it is unset.
pub fn record_pos(record: &RecordBuf) -> usize {
    record.variant_start().map(usize::from).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn read_cohort_vcf() -> Result<(), anyhow::Error> {
        let mut reader = open_vcf_reader("tests/data/variants/cohort.vcf")?;
        let header = reader.read_header()?;

        let mut record = RecordBuf::default();
        assert!(reader.read_record_buf(&header, &mut record)? > 0);

        assert_eq!(record_id(&record), "chr1_1000_G_A");
        assert_eq!(record_pos(&record), 1000);
        assert_eq!(record_alt(&record), "A");
        assert_eq!(
            sample_genotype(&record, 0),
            Some(String::from("0/1"))
        );
        assert_eq!(
            sample_genotype(&record, 3),
            Some(String::from("./."))
        );
        let csq = info_string(&record, "CSQ").unwrap_or_default();
        assert_eq!(csq.split(',').count(), 2);
        assert_eq!(info_float(&record, "CSQ"), None);

        Ok(())
    }
}
