//! Sample metadata of the cohort and its split into cases and controls.
//!
//! The metadata is a JSON list of objects such as
//!
//! ```json
//! [{"sample_id": "S1", "is_affected": true, "ancestry": "EUR",
//!   "tissue_type": "blood", "contact": "lab", "linkto_id": "4DNA1"}]
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata of one sample.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SampleInfo {
    /// Sample ID as in the VCF header.
    pub sample_id: String,
    /// Whether the sample is a case.
    #[serde(default, deserialize_with = "truthy::deserialize")]
    pub is_affected: bool,
    /// Inferred ancestry.
    #[serde(default, deserialize_with = "text_option::deserialize")]
    pub ancestry: Option<String>,
    /// Tissue the sample was taken from.
    #[serde(default, deserialize_with = "text_option::deserialize")]
    pub tissue_type: Option<String>,
    /// Contact of the submitting lab.
    #[serde(default, deserialize_with = "text_option::deserialize")]
    pub contact: Option<String>,
    /// Identifier of the sample in the data portal.
    #[serde(default, deserialize_with = "text_option::deserialize")]
    pub linkto_id: Option<String>,
}

/// Metadata of all samples of a cohort.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cohort {
    pub samples: IndexMap<String, SampleInfo>,
}

impl Cohort {
    /// Decode from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        let samples: Vec<SampleInfo> = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("could not decode sample info JSON: {}", e))?;
        Ok(Self {
            samples: samples
                .into_iter()
                .map(|s| (s.sample_id.clone(), s))
                .collect(),
        })
    }

    /// Load from the given path.
    pub fn from_path<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "could not read sample info from {}: {}",
                path.as_ref().display(),
                e
            )
        })?;
        Self::from_json(&json)
    }

    /// Decode a command line argument, either JSON or `@path` of a JSON file.
    pub fn from_arg(arg: &str) -> Result<Self, anyhow::Error> {
        match arg.strip_prefix('@') {
            Some(path) => Self::from_path(path),
            None => Self::from_json(arg),
        }
    }

    pub fn get(&self, sample_id: &str) -> Option<&SampleInfo> {
        self.samples.get(sample_id)
    }

    /// IDs of the affected samples.
    pub fn case_ids(&self) -> Vec<&str> {
        self.samples
            .values()
            .filter(|s| s.is_affected)
            .map(|s| s.sample_id.as_str())
            .collect()
    }
}

/// Indices of the case and control samples in the VCF sample list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub cases: Vec<usize>,
    pub controls: Vec<usize>,
}

impl Partition {
    /// Split the VCF samples into the given cases and all remaining samples as controls.
    ///
    /// Fails if a case is not a VCF sample.
    pub fn new<S: AsRef<str>>(vcf_samples: &[S], case_ids: &[&str]) -> Result<Self, anyhow::Error> {
        let index = vcf_samples
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_ref(), idx))
            .collect::<IndexMap<_, _>>();

        let missing = case_ids
            .iter()
            .filter(|id| !index.contains_key(**id))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            anyhow::bail!(
                "not every case ID could be found in the cohort VCF, missing: {:?}",
                missing
            );
        }

        let cases = case_ids
            .iter()
            .filter_map(|id| index.get(*id).copied())
            .collect::<Vec<_>>();
        let controls = (0..vcf_samples.len())
            .filter(|idx| !cases.contains(idx))
            .collect();
        Ok(Self { cases, controls })
    }
}

/// Deserialize a JSON value by its truthiness.
mod truthy {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        })
    }
}

/// Deserialize an optional text value that may also be given as a number.
mod text_option {
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(de::Error::custom(format!(
                "expected text value, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const JSON: &str = r#"[
        {"sample_id": "S1", "is_affected": true, "ancestry": "EUR", "tissue_type": "blood",
         "contact": "lab1", "linkto_id": "4DNA1"},
        {"sample_id": "S2", "is_affected": 0, "ancestry": "AFR", "tissue_type": null,
         "contact": null, "linkto_id": 17},
        {"sample_id": "S3", "is_affected": 1},
        {"sample_id": "S4", "is_affected": false}
    ]"#;

    #[test]
    fn from_json() -> Result<(), anyhow::Error> {
        let cohort = Cohort::from_json(JSON)?;

        assert_eq!(cohort.samples.len(), 4);
        assert_eq!(
            cohort.get("S1"),
            Some(&SampleInfo {
                sample_id: String::from("S1"),
                is_affected: true,
                ancestry: Some(String::from("EUR")),
                tissue_type: Some(String::from("blood")),
                contact: Some(String::from("lab1")),
                linkto_id: Some(String::from("4DNA1")),
            })
        );
        let s2 = cohort.get("S2").cloned().unwrap_or_default();
        assert!(!s2.is_affected);
        assert_eq!(s2.tissue_type, None);
        assert_eq!(s2.linkto_id, Some(String::from("17")));
        assert_eq!(cohort.case_ids(), vec!["S1", "S3"]);

        Ok(())
    }

    #[test]
    fn from_json_invalid() {
        assert!(Cohort::from_json("{not json").is_err());
        assert!(Cohort::from_json(r#"[{"is_affected": true}]"#).is_err());
    }

    #[test]
    fn from_arg_path() -> Result<(), anyhow::Error> {
        let cohort = Cohort::from_arg("@tests/data/samples/sample_info.json")?;
        assert_eq!(cohort.case_ids(), vec!["S1", "S2"]);

        Ok(())
    }

    #[test]
    fn partition() -> Result<(), anyhow::Error> {
        let vcf_samples = ["S1", "S2", "S3", "S4"];
        let partition = Partition::new(&vcf_samples, &["S3", "S1"])?;

        assert_eq!(partition.cases, vec![2, 0]);
        assert_eq!(partition.controls, vec![1, 3]);

        Ok(())
    }

    #[test]
    fn partition_missing_case() {
        let err = Partition::new(&["S1", "S2"], &["S1", "S9"])
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.starts_with("not every case ID could be found in the cohort VCF"));
        assert!(err.contains("S9"));
    }
}
