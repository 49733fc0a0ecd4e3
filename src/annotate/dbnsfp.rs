//! Resolution of multi-valued dbNSFP sub fields to the annotated transcript.
//!
//! dbNSFP reports one value per Ensembl transcript it knows about, `&`-separated and keyed
//! by the `Ensembl_transcriptid` list.  VEP attaches the full lists to every transcript, so
//! each list is reduced to the entry of the transcript in the `Feature` field.

use super::schema::CsqSchema;
use super::transcript::{parse_transcripts, TranscriptAnnotation};
use super::MULTI_VALUE_SEP;
use crate::error::Error;

/// The sub fields that are resolved by transcript.
pub const DBNSFP_FIELDS: &[&str] = &[
    "Polyphen2_HVAR_pred",
    "Polyphen2_HVAR_score",
    "SIFT_pred",
    "SIFT_score",
];

/// Sub field with the `&`-separated transcript IDs known to dbNSFP.
pub const DBNSFP_TRANSCRIPT_ID_FIELD: &str = "Ensembl_transcriptid";

/// Sub field with the ID of the annotated transcript.
pub const TRANSCRIPT_ID_FIELD: &str = "Feature";

/// dbNSFP placeholder for a missing value.
const MISSING: &str = ".";

/// Resolves the dbNSFP sub fields of transcript annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbnsfpResolver {
    /// Indices of the resolved sub fields.
    field_idxs: Vec<usize>,
    /// Index of the dbNSFP transcript ID list.
    aux_id_idx: usize,
    /// Index of the transcript ID.
    id_idx: usize,
}

impl DbnsfpResolver {
    pub fn new(field_idxs: Vec<usize>, aux_id_idx: usize, id_idx: usize) -> Self {
        Self {
            field_idxs,
            aux_id_idx,
            id_idx,
        }
    }

    /// Look up all indices in `schema`, failing if any sub field is not declared.
    pub fn from_schema(schema: &CsqSchema) -> Result<Self, Error> {
        Ok(Self {
            field_idxs: DBNSFP_FIELDS
                .iter()
                .map(|name| schema.field_idx(name))
                .collect::<Result<Vec<_>, _>>()?,
            aux_id_idx: schema.field_idx(DBNSFP_TRANSCRIPT_ID_FIELD)?,
            id_idx: schema.field_idx(TRANSCRIPT_ID_FIELD)?,
        })
    }

    /// Reduce the dbNSFP sub fields of one transcript in place.
    pub fn resolve(&self, transcript: &mut TranscriptAnnotation) -> Result<(), Error> {
        let id = transcript.field(self.id_idx)?;
        let pos = transcript
            .field(self.aux_id_idx)?
            .split(MULTI_VALUE_SEP)
            .position(|aux_id| aux_id == id);

        for &idx in &self.field_idxs {
            let value = match pos {
                Some(pos) => match transcript.field(idx)?.split(MULTI_VALUE_SEP).nth(pos) {
                    Some(MISSING) | None => String::new(),
                    Some(value) => value.to_string(),
                },
                None => String::new(),
            };
            transcript.set_field(idx, value)?;
        }

        Ok(())
    }

    /// Parse and resolve all transcripts of an annotation value.
    ///
    /// Returns `None` if the record carries no annotation.
    pub fn resolve_annotation(
        &self,
        value: Option<&str>,
    ) -> Result<Option<Vec<TranscriptAnnotation>>, Error> {
        let Some(value) = value else {
            return Ok(None);
        };
        let mut transcripts = parse_transcripts(value);
        for transcript in transcripts.iter_mut() {
            self.resolve(transcript)?;
        }
        Ok(Some(transcripts))
    }
}
