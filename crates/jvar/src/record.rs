//! Submission record types and the record container handed to the validator.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record types (sheets) of a JVar submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    Study,
    SampleSet,
    Sample,
    Experiment,
    Assay,
    #[serde(rename = "Variant Call")]
    VariantCall,
    #[serde(rename = "Variant Region")]
    VariantRegion,
}

impl RecordType {
    /// All record types in submission order.
    pub const ALL: [RecordType; 7] = [
        RecordType::Study,
        RecordType::SampleSet,
        RecordType::Sample,
        RecordType::Experiment,
        RecordType::Assay,
        RecordType::VariantCall,
        RecordType::VariantRegion,
    ];

    /// Sheet label as it appears in submission workbooks.
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::Study => "Study",
            RecordType::SampleSet => "SampleSet",
            RecordType::Sample => "Sample",
            RecordType::Experiment => "Experiment",
            RecordType::Assay => "Assay",
            RecordType::VariantCall => "Variant Call",
            RecordType::VariantRegion => "Variant Region",
        }
    }

    /// Whether records of this type carry a variant type taxonomy field.
    pub fn is_variant(&self) -> bool {
        matches!(self, RecordType::VariantCall | RecordType::VariantRegion)
    }

    /// Parse a record type from a sheet label (case-insensitive, spacing tolerant).
    pub fn from_str_flexible(s: &str) -> Option<Self> {
        let s = s.to_lowercase().replace(['-', '_', ' '], "");
        match s.as_str() {
            "study" => Some(RecordType::Study),
            "sampleset" => Some(RecordType::SampleSet),
            "sample" => Some(RecordType::Sample),
            "experiment" => Some(RecordType::Experiment),
            "assay" => Some(RecordType::Assay),
            "variantcall" | "call" => Some(RecordType::VariantCall),
            "variantregion" | "region" => Some(RecordType::VariantRegion),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One logical record of a submission: its type plus field values in sheet order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub record_type: RecordType,
    pub fields: IndexMap<String, String>,
}

impl SubmissionRecord {
    /// Create an empty record.
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            fields: IndexMap::new(),
        }
    }

    /// Add a field value under its trimmed name.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a field value under its trimmed name, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name: String = name.into();
        let name = if name.trim().len() == name.len() {
            name
        } else {
            name.trim().to_string()
        };
        self.fields.insert(name, value.into());
    }

    /// Trimmed value of a field; empty values count as absent.
    ///
    /// Field names are compared after trimming, so keys inserted directly
    /// into `fields` with stray whitespace still match.
    pub fn value(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.fields
            .get(name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(k, _)| k.trim() == name)
                    .map(|(_, v)| v)
            })
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Names of fields carrying a non-empty value.
    pub fn present_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, _)| k.trim())
    }
}

impl<K, V> Extend<(K, V)> for SubmissionRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_from_label() {
        assert_eq!(RecordType::from_str_flexible("Variant Call"), Some(RecordType::VariantCall));
        assert_eq!(RecordType::from_str_flexible("VariantRegion"), Some(RecordType::VariantRegion));
        assert_eq!(RecordType::from_str_flexible("sample_set"), Some(RecordType::SampleSet));
        assert_eq!(RecordType::from_str_flexible("genotype"), None);
    }

    #[test]
    fn test_record_type_serde_uses_sheet_label() {
        let json = serde_json::to_string(&RecordType::VariantCall).unwrap();
        assert_eq!(json, "\"Variant Call\"");
        let parsed: RecordType = serde_json::from_str("\"SampleSet\"").unwrap();
        assert_eq!(parsed, RecordType::SampleSet);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let record = SubmissionRecord::new(RecordType::Study)
            .with_field("Study Title", "  ")
            .with_field("Submission Type", " SV ");

        assert_eq!(record.value("Study Title"), None);
        assert_eq!(record.value("Submission Type"), Some("SV"));
        assert_eq!(record.present_fields().collect::<Vec<_>>(), vec!["Submission Type"]);
    }

    #[test]
    fn test_field_names_are_trimmed() {
        let mut record = SubmissionRecord::new(RecordType::VariantCall).with_field("Chr ", "chr1");
        record.extend([(" Start", "100")]);
        record.fields.insert("\tStop ".to_string(), "200".to_string());

        assert_eq!(record.value("Chr"), Some("chr1"));
        assert_eq!(record.value("Start"), Some("100"));
        assert_eq!(record.value("Stop"), Some("200"));
        assert!(record.fields.contains_key("Chr"));
    }
}
