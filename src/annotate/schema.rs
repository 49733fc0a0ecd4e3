//! Lookup of `CSQ` sub field indices from the VCF header.

use indexmap::IndexMap;
use noodles::vcf;

use super::FIELD_SEP;
use crate::error::Error;

/// Marker preceding the sub field list in the INFO header description.
const FORMAT_MARKER: &str = "Format:";

/// Column layout of a `|`-delimited annotation INFO tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsqSchema {
    tag: String,
    fields: IndexMap<String, usize>,
}

impl CsqSchema {
    /// Construct from the tag name and the ordered field names.
    pub fn new<I, S>(tag: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = IndexMap::new();
        for (idx, name) in fields.into_iter().enumerate() {
            // first declaration wins on duplicated names
            map.entry(name.into()).or_insert(idx);
        }
        Self {
            tag: tag.to_string(),
            fields: map,
        }
    }

    /// Parse the header description of the tag, e.g.
    /// `Consequence annotations from Ensembl VEP. Format: Allele|Consequence|IMPACT`.
    pub fn from_description(tag: &str, description: &str) -> Result<Self, Error> {
        let (_, format) =
            description
                .split_once(FORMAT_MARKER)
                .ok_or_else(|| Error::MissingFormat {
                    tag: tag.to_string(),
                })?;
        let format = format.trim().trim_matches('"').trim();
        Ok(Self::new(tag, format.split(FIELD_SEP).map(str::trim)))
    }

    /// Construct from the INFO definition of `tag` in the VCF header.
    pub fn from_header(header: &vcf::Header, tag: &str) -> Result<Self, Error> {
        let info = header.infos().get(tag).ok_or_else(|| Error::MissingTag {
            tag: tag.to_string(),
        })?;
        Self::from_description(tag, info.description())
    }

    /// Name of the INFO tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Number of declared sub fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Index of the sub field `name`, an error if it is not declared.
    pub fn field_idx(&self, name: &str) -> Result<usize, Error> {
        self.fields
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndeclaredField {
                tag: self.tag.clone(),
                field: name.to_string(),
            })
    }

    /// Names and indices of all sub fields whose name ends with `suffix`, in declaration order.
    pub fn find_suffix(&self, suffix: &str) -> Vec<(&str, usize)> {
        self.fields
            .iter()
            .filter(|(name, _)| name.ends_with(suffix))
            .map(|(name, idx)| (name.as_str(), *idx))
            .collect()
    }
}
