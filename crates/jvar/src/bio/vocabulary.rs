//! Controlled vocabularies and required-field policies per record type.
//!
//! Each (record type, field) pair may carry a closed vocabulary of canonical
//! values. Values are compared case-sensitively after trimming; a field
//! without a registered vocabulary accepts free text.
//!
//! Required fields come in two tiers:
//!
//! - **hard** fields whose absence blocks the submission
//! - **soft** (ignorable) fields whose absence is only reported as a warning
//!
//! Some record types (SampleSet) only have soft entries and are therefore
//! never rejected for missing fields.
//!
//! # Example
//!
//! ```ignore
//! use jvar::bio::VocabularyValidator;
//!
//! let validator = VocabularyValidator::new(store);
//! validator.validate_field(RecordType::Study, "Submission Type", "SV")?;
//! let missing = validator.validate_required_fields(RecordType::Study, ["Study Title"]);
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{LoadError, ResolveError, Result};
use crate::record::RecordType;
use crate::store::ReferenceDataStore;
use crate::tables::{VOCABULARIES, VocabularyTable};
use crate::validation::Severity;

/// Maximum number of suggestions attached to an invalid value.
const MAX_SUGGESTIONS: usize = 3;

static EMPTY_POLICY: Lazy<RequiredFieldPolicy> = Lazy::new(RequiredFieldPolicy::default);

/// Closed set of canonical values for one record field.
#[derive(Debug, Clone, Serialize)]
pub struct ControlledVocabulary {
    pub record_type: RecordType,
    pub field: String,
    values: IndexSet<String>,
}

impl ControlledVocabulary {
    /// Canonical values in table order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the trimmed value is one of the canonical values.
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value.trim())
    }

    /// Canonical values close to a rejected input.
    ///
    /// Case-only differences rank first, then spelling distance of at most two edits.
    pub fn suggest(&self, value: &str) -> Vec<String> {
        let value = value.trim();
        let lower = value.to_lowercase();

        let mut suggestions: Vec<String> = self
            .values
            .iter()
            .filter(|v| v.to_lowercase() == lower)
            .cloned()
            .collect();

        let mut near: Vec<(usize, &String)> = self
            .values
            .iter()
            .filter(|v| !suggestions.contains(v))
            .map(|v| (levenshtein(&lower, &v.to_lowercase()), v))
            .filter(|(d, _)| *d <= 2)
            .collect();
        near.sort_by_key(|(d, _)| *d);
        suggestions.extend(near.into_iter().map(|(_, v)| v.clone()));

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

/// Required-field tiers for one record type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequiredFieldPolicy {
    hard: IndexSet<String>,
    soft: IndexSet<String>,
}

impl RequiredFieldPolicy {
    /// Fields whose absence is an error, in policy order.
    pub fn hard(&self) -> impl Iterator<Item = &str> {
        self.hard.iter().map(|f| f.as_str())
    }

    /// Fields whose absence is only a warning.
    pub fn soft(&self) -> impl Iterator<Item = &str> {
        self.soft.iter().map(|f| f.as_str())
    }

    pub fn is_hard(&self, field: &str) -> bool {
        self.hard.contains(field)
    }

    pub fn is_soft(&self, field: &str) -> bool {
        self.soft.contains(field)
    }
}

/// Indexed vocabularies and required-field policies.
#[derive(Debug, Clone)]
pub struct VocabularyCatalog {
    vocabularies: HashMap<RecordType, HashMap<String, ControlledVocabulary>>,
    policies: HashMap<RecordType, RequiredFieldPolicy>,
}

impl VocabularyCatalog {
    pub(crate) fn from_table(table: VocabularyTable) -> std::result::Result<Self, LoadError> {
        let mut vocabularies: HashMap<RecordType, HashMap<String, ControlledVocabulary>> =
            HashMap::new();

        for (idx, row) in table.vocabularies.into_iter().enumerate() {
            let record_type = parse_record_type(idx + 1, &row.record_type)?;
            let field = row.field.trim().to_string();

            let mut values = IndexSet::new();
            for value in row.values {
                let value = value.trim().to_string();
                if !values.insert(value.clone()) {
                    return Err(LoadError::Duplicate {
                        table: VOCABULARIES,
                        key: format!("{record_type}/{field}/{value}"),
                    });
                }
            }
            if values.is_empty() {
                return Err(LoadError::Invariant {
                    table: VOCABULARIES,
                    message: format!("vocabulary {record_type}/{field} is empty"),
                });
            }

            let by_field = vocabularies.entry(record_type).or_default();
            if by_field.contains_key(&field) {
                return Err(LoadError::Duplicate {
                    table: VOCABULARIES,
                    key: format!("{record_type}/{field}"),
                });
            }
            by_field.insert(
                field.clone(),
                ControlledVocabulary {
                    record_type,
                    field,
                    values,
                },
            );
        }

        let mut policies: HashMap<RecordType, RequiredFieldPolicy> = RecordType::ALL
            .iter()
            .map(|rt| (*rt, RequiredFieldPolicy::default()))
            .collect();

        for (idx, (label, fields)) in table.required_fields.into_iter().enumerate() {
            let record_type = parse_record_type(idx + 1, &label)?;
            let policy = policies.entry(record_type).or_default();
            policy.hard.extend(fields.into_iter().map(|f| f.trim().to_string()));
        }
        for (idx, (label, fields)) in table.ignorable_fields.into_iter().enumerate() {
            let record_type = parse_record_type(idx + 1, &label)?;
            let policy = policies.entry(record_type).or_default();
            policy.soft.extend(fields.into_iter().map(|f| f.trim().to_string()));
        }

        for (record_type, policy) in &policies {
            if let Some(field) = policy.hard.iter().find(|f| policy.soft.contains(*f)) {
                return Err(LoadError::Invariant {
                    table: VOCABULARIES,
                    message: format!(
                        "field '{field}' is both required and ignorable for {record_type}"
                    ),
                });
            }
        }

        Ok(Self {
            vocabularies,
            policies,
        })
    }

    /// Vocabulary for a field, if it is closed.
    pub fn get(&self, record_type: RecordType, field: &str) -> Option<&ControlledVocabulary> {
        self.vocabularies.get(&record_type)?.get(field.trim())
    }

    /// Required-field policy; record types without entries get an empty policy.
    pub fn policy(&self, record_type: RecordType) -> &RequiredFieldPolicy {
        self.policies.get(&record_type).unwrap_or(&*EMPTY_POLICY)
    }

    /// All vocabularies of a record type.
    pub fn for_record_type(
        &self,
        record_type: RecordType,
    ) -> impl Iterator<Item = &ControlledVocabulary> {
        self.vocabularies
            .get(&record_type)
            .into_iter()
            .flat_map(|m| m.values())
    }

    /// Total number of closed vocabularies.
    pub fn len(&self) -> usize {
        self.vocabularies.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_record_type(row: usize, label: &str) -> std::result::Result<RecordType, LoadError> {
    RecordType::from_str_flexible(label).ok_or_else(|| LoadError::Malformed {
        table: VOCABULARIES,
        row,
        message: format!("unknown record type '{label}'"),
    })
}

/// A required field missing from a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingField {
    pub record_type: RecordType,
    pub field: String,
    /// `Error` for hard-required fields, `Warning` for ignorable ones.
    pub severity: Severity,
}

impl MissingField {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Checks field values and required-field presence against the reference vocabularies.
#[derive(Debug, Clone, Copy)]
pub struct VocabularyValidator<'a> {
    catalog: &'a VocabularyCatalog,
}

impl<'a> VocabularyValidator<'a> {
    pub fn new(store: &'a ReferenceDataStore) -> Self {
        Self {
            catalog: store.vocabularies(),
        }
    }

    /// Check one value against the field's closed vocabulary.
    ///
    /// Fields without a vocabulary always pass.
    pub fn validate_field(&self, record_type: RecordType, field: &str, value: &str) -> Result<()> {
        let Some(vocabulary) = self.catalog.get(record_type, field) else {
            return Ok(());
        };
        if vocabulary.contains(value) {
            return Ok(());
        }
        Err(ResolveError::InvalidVocabularyValue {
            record_type,
            field: vocabulary.field.clone(),
            value: value.trim().to_string(),
            suggestions: vocabulary.suggest(value),
        })
    }

    /// Report required fields absent from `present_fields`.
    ///
    /// Hard fields come first in policy order, followed by soft fields.
    pub fn validate_required_fields<I, S>(
        &self,
        record_type: RecordType,
        present_fields: I,
    ) -> Vec<MissingField>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let present: HashSet<String> = present_fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .collect();
        let policy = self.catalog.policy(record_type);

        let hard = policy.hard().map(|f| (f, Severity::Error));
        let soft = policy.soft().map(|f| (f, Severity::Warning));
        hard.chain(soft)
            .filter(|(field, _)| !present.contains(*field))
            .map(|(field, severity)| MissingField {
                record_type,
                field: field.to_string(),
                severity,
            })
            .collect()
    }

    /// The vocabulary backing a field, if any.
    pub fn vocabulary(
        &self,
        record_type: RecordType,
        field: &str,
    ) -> Option<&'a ControlledVocabulary> {
        self.catalog.get(record_type, field)
    }
}

/// Edit distance between two strings, counted in characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> &'static ReferenceDataStore {
        ReferenceDataStore::embedded()
    }

    #[test]
    fn test_closed_vocabulary_accepts_canonical_value() {
        let validator = VocabularyValidator::new(store());
        assert!(validator.validate_field(RecordType::Study, "Submission Type", "SV").is_ok());
        assert!(validator.validate_field(RecordType::Study, "Submission Type", "  SNP ").is_ok());
    }

    #[test]
    fn test_closed_vocabulary_is_case_sensitive() {
        let validator = VocabularyValidator::new(store());

        match validator.validate_field(RecordType::VariantCall, "Call Type", "alu deletion") {
            Err(ResolveError::InvalidVocabularyValue { suggestions, .. }) => {
                assert_eq!(suggestions.first().map(String::as_str), Some("Alu deletion"));
            }
            other => panic!("Expected InvalidVocabularyValue, got {:?}", other),
        }
    }

    #[test]
    fn test_free_text_field_passes() {
        let validator = VocabularyValidator::new(store());
        assert!(
            validator
                .validate_field(RecordType::Study, "Study Title", "anything at all")
                .is_ok()
        );
    }

    #[test]
    fn test_typo_suggestion() {
        let validator = VocabularyValidator::new(store());

        match validator.validate_field(RecordType::Experiment, "Method Type", "Sequencin") {
            Err(ResolveError::InvalidVocabularyValue { suggestions, .. }) => {
                assert!(suggestions.contains(&"Sequencing".to_string()));
            }
            other => panic!("Expected InvalidVocabularyValue, got {:?}", other),
        }
    }

    #[test]
    fn test_required_fields_hard_and_soft() {
        let validator = VocabularyValidator::new(store());
        let missing = validator.validate_required_fields(
            RecordType::Experiment,
            ["Experiment ID", "Method Type"],
        );

        let hard: Vec<_> = missing.iter().filter(|m| m.is_blocking()).collect();
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].field, "Analysis Type");
        assert!(missing.iter().any(|m| m.field == "Platform" && !m.is_blocking()));
    }

    #[test]
    fn test_sample_set_only_soft_requirements() {
        let validator = VocabularyValidator::new(store());
        let missing =
            validator.validate_required_fields(RecordType::SampleSet, Vec::<String>::new());

        assert!(!missing.is_empty());
        assert!(missing.iter().all(|m| !m.is_blocking()));
    }

    #[test]
    fn test_policy_sets_are_disjoint() {
        let catalog = store().vocabularies();
        for record_type in RecordType::ALL {
            let policy = catalog.policy(record_type);
            assert!(policy.hard().all(|f| !policy.is_soft(f)));
        }
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }
}
