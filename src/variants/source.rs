//! Streaming of cohort variants from an annotated VCF file.

use std::path::Path;

use noodles::vcf;
use noodles::vcf::variant::RecordBuf;

use crate::annotate::schema::CsqSchema;
use crate::common::noodles::{
    info_string, open_vcf_reader, record_alt, record_id, record_pos, sample_genotype, VcfReader,
};

/// The data of one VCF record needed by the cohort tools.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CohortVariant {
    pub chrom: String,
    pub pos: usize,
    pub id: String,
    pub reference: String,
    pub alternative: String,
    /// Raw value of the annotation INFO tag, `None` if the record is not annotated.
    pub annotation: Option<String>,
    /// `GT` of each sample, in VCF sample order.
    pub genotypes: Vec<String>,
}

impl CohortVariant {
    /// Extract from a noodles record.
    pub fn from_record(
        record: &RecordBuf,
        header: &vcf::Header,
        annotation_tag: &str,
    ) -> Result<Self, anyhow::Error> {
        let id = record_id(record);
        let genotypes = (0..header.sample_names().len())
            .map(|idx| {
                sample_genotype(record, idx).ok_or_else(|| {
                    anyhow::anyhow!("no GT value for sample #{} of variant {}", idx, id)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            chrom: record.reference_sequence_name().to_string(),
            pos: record_pos(record),
            reference: record.reference_bases().to_string(),
            alternative: record_alt(record),
            annotation: info_string(record, annotation_tag),
            genotypes,
            id,
        })
    }

    /// Genotypes of the samples at the given indices.
    pub fn genotypes_of<'a>(&'a self, idxs: &'a [usize]) -> impl Iterator<Item = &'a str> + 'a {
        idxs.iter()
            .filter_map(|idx| self.genotypes.get(*idx).map(String::as_str))
    }
}

/// Reads [`CohortVariant`]s from a plain or bgzip compressed VCF file.
pub struct VcfVariantSource {
    reader: VcfReader,
    header: vcf::Header,
    record: RecordBuf,
    annotation_tag: String,
}

impl VcfVariantSource {
    /// Open the file at `path` and read its header.
    pub fn open<P>(path: P, annotation_tag: &str) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        let mut reader = open_vcf_reader(path.as_ref())?;
        let header = reader.read_header().map_err(|e| {
            anyhow::anyhow!(
                "could not read VCF header of {}: {}",
                path.as_ref().display(),
                e
            )
        })?;
        Ok(Self {
            reader,
            header,
            record: RecordBuf::default(),
            annotation_tag: annotation_tag.to_string(),
        })
    }

    pub fn header(&self) -> &vcf::Header {
        &self.header
    }

    /// Names of the samples in VCF order.
    pub fn sample_names(&self) -> Vec<String> {
        self.header.sample_names().iter().cloned().collect()
    }

    /// Column layout of the annotation tag.
    pub fn schema(&self) -> Result<CsqSchema, anyhow::Error> {
        Ok(CsqSchema::from_header(&self.header, &self.annotation_tag)?)
    }

    /// Read the next variant, `None` at the end of the file.
    pub fn read_variant(&mut self) -> Result<Option<CohortVariant>, anyhow::Error> {
        if self.reader.read_record_buf(&self.header, &mut self.record)? == 0 {
            return Ok(None);
        }
        CohortVariant::from_record(&self.record, &self.header, &self.annotation_tag).map(Some)
    }
}

impl Iterator for VcfVariantSource {
    type Item = Result<CohortVariant, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_variant().transpose()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn read_cohort_vcf() -> Result<(), anyhow::Error> {
        let source = VcfVariantSource::open("tests/data/variants/cohort.vcf", "CSQ")?;
        assert_eq!(source.sample_names(), vec!["S1", "S2", "S3", "S4"]);

        let variants = source.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(variants.len(), 4);

        let first = &variants[0];
        assert_eq!(first.chrom, "chr1");
        assert_eq!(first.pos, 1000);
        assert_eq!(first.id, "chr1_1000_G_A");
        assert_eq!(first.reference, "G");
        assert_eq!(first.alternative, "A");
        assert_eq!(first.genotypes, vec!["0/1", "1/1", "0/0", "./."]);
        assert_eq!(
            first.genotypes_of(&[1, 3]).collect::<Vec<_>>(),
            vec!["1/1", "./."]
        );
        assert!(first.annotation.is_some());

        assert_eq!(variants[3].annotation, None);

        Ok(())
    }

    #[rstest::rstest]
    #[case("tests/data/variants/cohort.vcf")]
    #[case("tests/data/variants/cohort_v44.vcf")]
    fn genotypes_independent_of_file_format(#[case] path: &str) -> Result<(), anyhow::Error> {
        let variants = VcfVariantSource::open(path, "CSQ")?.collect::<Result<Vec<_>, _>>()?;

        assert_eq!(variants[0].genotypes, vec!["0/1", "1/1", "0/0", "./."]);
        assert_eq!(variants[1].genotypes, vec!["0/0", "0/1", "0|1", "1|1"]);

        Ok(())
    }
}
