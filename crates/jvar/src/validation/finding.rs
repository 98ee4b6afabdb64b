//! Findings produced while validating a submission record.

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::record::RecordType;

/// Kind of problem a finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A required field is absent or empty.
    MissingField,
    /// Value outside the field's controlled vocabulary.
    InvalidVocabularyValue,
    UnknownCallType,
    UnknownRegionType,
    /// Supporting call type cannot support the region type.
    IncompatibleCallRegionPair,
    UnknownAssembly,
    UnknownSequence,
    /// Coordinates outside the sequence or inverted.
    CoordinateOutOfRange,
    /// Coordinate value is not a positive integer.
    MalformedCoordinate,
    UnknownSample,
    /// BioSample accession disagrees with the sample registry.
    BioSampleMismatch,
}

impl FindingKind {
    /// Get a human-readable label for the finding kind.
    pub fn label(&self) -> &'static str {
        match self {
            FindingKind::MissingField => "Missing Field",
            FindingKind::InvalidVocabularyValue => "Invalid Vocabulary Value",
            FindingKind::UnknownCallType => "Unknown Call Type",
            FindingKind::UnknownRegionType => "Unknown Region Type",
            FindingKind::IncompatibleCallRegionPair => "Incompatible Call/Region Pair",
            FindingKind::UnknownAssembly => "Unknown Assembly",
            FindingKind::UnknownSequence => "Unknown Sequence",
            FindingKind::CoordinateOutOfRange => "Coordinate Out of Range",
            FindingKind::MalformedCoordinate => "Malformed Coordinate",
            FindingKind::UnknownSample => "Unknown Sample",
            FindingKind::BioSampleMismatch => "BioSample Mismatch",
        }
    }
}

impl From<&ResolveError> for FindingKind {
    fn from(error: &ResolveError) -> Self {
        match error {
            ResolveError::UnknownAssembly(_) => FindingKind::UnknownAssembly,
            ResolveError::UnknownSequence { .. } => FindingKind::UnknownSequence,
            ResolveError::UnknownCallType(_) => FindingKind::UnknownCallType,
            ResolveError::UnknownRegionType(_) => FindingKind::UnknownRegionType,
            ResolveError::UnknownSample(_) => FindingKind::UnknownSample,
            ResolveError::InvalidVocabularyValue { .. } => FindingKind::InvalidVocabularyValue,
            ResolveError::IncompatibleCallRegionPair { .. }
            | ResolveError::AmbiguousOrUnknownMapping(_) => FindingKind::IncompatibleCallRegionPair,
            ResolveError::CoordinateOutOfRange { .. } => FindingKind::CoordinateOutOfRange,
        }
    }
}

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, but does not block the submission.
    Warning,
    /// Blocks the submission.
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// One problem found in a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    /// Offending field name.
    pub field: String,
    /// Offending value, when the field had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Human-readable description.
    pub description: String,
    /// Canonical values the submitter may have meant.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub suggestions: Vec<String>,
}

impl Finding {
    /// Create a new finding.
    pub fn new(
        kind: FindingKind,
        severity: Severity,
        field: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            field: field.into(),
            value: None,
            description: description.into(),
            suggestions: Vec::new(),
        }
    }

    /// Build a finding from a failed resolver operation.
    pub fn from_error(error: &ResolveError, severity: Severity, field: impl Into<String>) -> Self {
        let finding = Self::new(FindingKind::from(error), severity, field, error.to_string());
        match error {
            ResolveError::InvalidVocabularyValue { suggestions, .. } => {
                finding.with_suggestions(suggestions.iter().cloned())
            }
            _ => finding,
        }
    }

    /// Set the offending value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Add suggestions.
    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions.extend(suggestions.into_iter().map(Into::into));
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of validating one record: every error and warning found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub record_type: RecordType,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationResult {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// File a finding under errors or warnings by its severity.
    pub fn push(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Error => self.errors.push(finding),
            Severity::Warning => self.warnings.push(finding),
        }
    }

    /// True when no errors were found; warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors followed by warnings.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Whether any finding of the given kind was reported.
    pub fn has(&self, kind: FindingKind) -> bool {
        self.findings().any(|f| f.kind == kind)
    }

    /// Whether an error of the given kind was reported for a field.
    pub fn has_error(&self, kind: FindingKind, field: &str) -> bool {
        self.errors.iter().any(|f| f.kind == kind && f.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_sorts_by_severity() {
        let mut result = ValidationResult::new(RecordType::Study);
        result.push(Finding::new(
            FindingKind::MissingField,
            Severity::Warning,
            "Study Type",
            "Missing ignorable field",
        ));
        assert!(result.is_valid());

        result.push(Finding::new(
            FindingKind::MissingField,
            Severity::Error,
            "Study Title",
            "Missing required field",
        ));
        assert!(!result.is_valid());
        assert_eq!(result.findings().next().map(|f| f.field.as_str()), Some("Study Title"));
        assert!(result.has_error(FindingKind::MissingField, "Study Title"));
        assert!(!result.has_error(FindingKind::MissingField, "Study Type"));
    }

    #[test]
    fn test_from_error_keeps_suggestions() {
        let error = ResolveError::InvalidVocabularyValue {
            record_type: RecordType::Study,
            field: "Submission Type".to_string(),
            value: "sv".to_string(),
            suggestions: vec!["SV".to_string()],
        };
        let finding =
            Finding::from_error(&error, Severity::Error, "Submission Type").with_value("sv");

        assert_eq!(finding.kind, FindingKind::InvalidVocabularyValue);
        assert_eq!(finding.suggestions, vec!["SV"]);
        assert_eq!(finding.value.as_deref(), Some("sv"));
    }

    #[test]
    fn test_serialization() {
        let finding = Finding::new(
            FindingKind::UnknownSample,
            Severity::Warning,
            "Sample ID",
            "Unknown sample",
        );
        let json = serde_json::to_value(&finding).unwrap();

        assert_eq!(json["kind"], "unknown_sample");
        assert_eq!(json["severity"], "warning");
        assert!(json.get("value").is_none());
        assert!(json.get("suggestions").is_none());
    }
}
