//! Record-level validation composing the reference resolvers.
//!
//! Each record goes through five independent checks; a failing check never
//! prevents the others from running:
//!
//! 1. required fields (hard → errors, ignorable → warnings)
//! 2. controlled vocabularies of every present field
//! 3. variant type resolution and call ⇄ region support
//! 4. assembly, sequence and coordinate checks
//! 5. sample registry lookups (warnings only)

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use crate::bio::{
    AssemblyResolver, SampleResolver, SequenceRecord, VariantTypeResolver, VocabularyValidator,
};
use crate::error::ResolveError;
use crate::record::{RecordType, SubmissionRecord};
use crate::store::ReferenceDataStore;
use crate::validation::{Finding, FindingKind, Severity, ValidationResult};

/// Names of the record fields the validator reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub assembly_field: String,
    pub chromosome_field: String,
    pub start_field: String,
    pub stop_field: String,
    /// Further single-position coordinates (outer/inner boundaries).
    pub extra_coordinate_fields: Vec<String>,
    pub call_type_field: String,
    pub region_type_field: String,
    /// May hold several call types separated by `,` or `;`.
    pub supporting_call_type_field: String,
    /// Fields holding a registry sample identifier.
    pub sample_id_fields: Vec<String>,
    pub biosample_field: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            assembly_field: "Assembly".to_string(),
            chromosome_field: "Chr".to_string(),
            start_field: "Start".to_string(),
            stop_field: "Stop".to_string(),
            extra_coordinate_fields: ["Outer Start", "Inner Start", "Inner Stop", "Outer Stop"]
                .map(String::from)
                .to_vec(),
            call_type_field: "Call Type".to_string(),
            region_type_field: "Region Type".to_string(),
            supporting_call_type_field: "Supporting Call Type".to_string(),
            sample_id_fields: ["Sample ID", "Subject ID"].map(String::from).to_vec(),
            biosample_field: "BioSample Accession".to_string(),
        }
    }
}

/// Validates submission records against the reference data.
#[derive(Debug, Clone)]
pub struct SubmissionRecordValidator<'a> {
    config: ValidatorConfig,
    vocabulary: VocabularyValidator<'a>,
    variant_types: VariantTypeResolver<'a>,
    assemblies: AssemblyResolver<'a>,
    samples: SampleResolver<'a>,
}

impl<'a> SubmissionRecordValidator<'a> {
    /// Create a validator with the default field names.
    pub fn new(store: &'a ReferenceDataStore) -> Self {
        Self::with_config(store, ValidatorConfig::default())
    }

    pub fn with_config(store: &'a ReferenceDataStore, config: ValidatorConfig) -> Self {
        Self {
            config,
            vocabulary: VocabularyValidator::new(store),
            variant_types: VariantTypeResolver::new(store),
            assemblies: AssemblyResolver::new(store),
            samples: SampleResolver::new(store),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate one record, collecting every finding.
    pub fn validate(&self, record: &SubmissionRecord) -> ValidationResult {
        let span = debug_span!("validate_record", record_type = %record.record_type);
        let _guard = span.enter();

        let mut result = ValidationResult::new(record.record_type);

        self.check_required_fields(record, &mut result);
        self.check_vocabularies(record, &mut result);
        self.check_variant_types(record, &mut result);
        self.check_coordinates(record, &mut result);
        self.check_samples(record, &mut result);

        debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated record"
        );
        result
    }

    /// Validate records in parallel; results keep the input order.
    pub fn validate_batch(&self, records: &[SubmissionRecord]) -> Vec<ValidationResult> {
        let results: Vec<ValidationResult> =
            records.par_iter().map(|record| self.validate(record)).collect();

        let invalid = results.iter().filter(|r| !r.is_valid()).count();
        if invalid > 0 {
            warn!(invalid, total = records.len(), "Batch contains invalid records");
        }
        results
    }

    fn check_required_fields(&self, record: &SubmissionRecord, result: &mut ValidationResult) {
        let missing = self
            .vocabulary
            .validate_required_fields(record.record_type, record.present_fields());

        for field in missing {
            let description = match field.severity {
                Severity::Error => format!("Required field '{}' is missing", field.field),
                Severity::Warning => format!("Field '{}' is missing", field.field),
            };
            result.push(Finding::new(
                FindingKind::MissingField,
                field.severity,
                field.field,
                description,
            ));
        }
    }

    fn check_vocabularies(&self, record: &SubmissionRecord, result: &mut ValidationResult) {
        for (name, value) in &record.fields {
            let (name, value) = (name.trim(), value.trim());
            if value.is_empty() {
                continue;
            }
            if let Err(e) = self.vocabulary.validate_field(record.record_type, name, value) {
                result.push(Finding::from_error(&e, Severity::Error, name).with_value(value));
            }
        }
    }

    fn check_variant_types(&self, record: &SubmissionRecord, result: &mut ValidationResult) {
        let config = &self.config;

        match record.record_type {
            RecordType::VariantCall => {
                let field = &config.call_type_field;
                let Some(call_type) = record.value(field) else {
                    return;
                };
                if let Err(e) = self.variant_types.resolve_call_type(call_type) {
                    if !self.vocabulary_rejects(record.record_type, field, call_type) {
                        result.push(
                            Finding::from_error(&e, Severity::Error, field).with_value(call_type),
                        );
                    }
                }
            }
            RecordType::VariantRegion => {
                let field = &config.region_type_field;
                let Some(region_type) = record.value(field) else {
                    return;
                };
                if let Err(e) = self.variant_types.resolve_region_type(region_type) {
                    if !self.vocabulary_rejects(record.record_type, field, region_type) {
                        result.push(
                            Finding::from_error(&e, Severity::Error, field)
                                .with_value(region_type),
                        );
                    }
                    return;
                }

                let Some(supporting) = record.value(&config.supporting_call_type_field) else {
                    return;
                };
                for call_type in split_list(supporting) {
                    if let Err(e) = self
                        .variant_types
                        .validate_call_supports_region(call_type, region_type)
                    {
                        result.push(
                            Finding::from_error(
                                &e,
                                Severity::Error,
                                &config.supporting_call_type_field,
                            )
                            .with_value(call_type),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    /// Whether the vocabulary check already reported this value.
    fn vocabulary_rejects(&self, record_type: RecordType, field: &str, value: &str) -> bool {
        self.vocabulary
            .vocabulary(record_type, field)
            .is_some_and(|vocabulary| !vocabulary.contains(value))
    }

    fn check_coordinates(&self, record: &SubmissionRecord, result: &mut ValidationResult) {
        let config = &self.config;

        let start = parse_coordinate(record, &config.start_field, result);
        let stop = parse_coordinate(record, &config.stop_field, result);
        let extra: Vec<(&str, u64)> = config
            .extra_coordinate_fields
            .iter()
            .filter_map(|field| {
                parse_coordinate(record, field, result).map(|pos| (field.as_str(), pos))
            })
            .collect();

        let Some(sequence) = self.resolve_sequence(record, result) else {
            return;
        };

        match (start, stop) {
            (Some(start), Some(stop)) => {
                if let Err(e) = self
                    .assemblies
                    .validate_coordinate_within_sequence(sequence, start, stop)
                {
                    let start_out = start == 0 || start > sequence.length;
                    let (field, value) = if start_out {
                        (&config.start_field, start)
                    } else {
                        (&config.stop_field, stop)
                    };
                    result.push(
                        Finding::from_error(&e, Severity::Error, field)
                            .with_value(value.to_string()),
                    );
                }
            }
            (Some(pos), None) => self.check_position(sequence, &config.start_field, pos, result),
            (None, Some(pos)) => self.check_position(sequence, &config.stop_field, pos, result),
            (None, None) => {}
        }

        for (field, pos) in extra {
            self.check_position(sequence, field, pos, result);
        }
    }

    fn resolve_sequence(
        &self,
        record: &SubmissionRecord,
        result: &mut ValidationResult,
    ) -> Option<&'a SequenceRecord> {
        let config = &self.config;
        let assembly = record.value(&config.assembly_field)?;
        let chromosome = record.value(&config.chromosome_field)?;

        match self.assemblies.resolve_sequence(assembly, chromosome) {
            Ok(sequence) => Some(sequence),
            Err(e) => {
                let (field, value) = match e {
                    ResolveError::UnknownAssembly(_) => (&config.assembly_field, assembly),
                    _ => (&config.chromosome_field, chromosome),
                };
                result.push(Finding::from_error(&e, Severity::Error, field).with_value(value));
                None
            }
        }
    }

    fn check_position(
        &self,
        sequence: &SequenceRecord,
        field: &str,
        pos: u64,
        result: &mut ValidationResult,
    ) {
        if let Err(e) = self
            .assemblies
            .validate_coordinate_within_sequence(sequence, pos, pos)
        {
            result.push(
                Finding::from_error(&e, Severity::Error, field).with_value(pos.to_string()),
            );
        }
    }

    fn check_samples(&self, record: &SubmissionRecord, result: &mut ValidationResult) {
        let config = &self.config;
        let biosample = record.value(&config.biosample_field);

        for field in &config.sample_id_fields {
            let Some(sample_id) = record.value(field) else {
                continue;
            };
            let sample = match self.samples.resolve_sample(sample_id) {
                Ok(sample) => sample,
                Err(e) => {
                    result.push(
                        Finding::from_error(&e, Severity::Warning, field).with_value(sample_id),
                    );
                    continue;
                }
            };

            let (Some(given), Some(registered)) = (biosample, sample.biosample_accession.as_deref())
            else {
                continue;
            };
            if !given.eq_ignore_ascii_case(registered) {
                result.push(
                    Finding::new(
                        FindingKind::BioSampleMismatch,
                        Severity::Warning,
                        &config.biosample_field,
                        format!(
                            "Sample '{sample_id}' is registered with BioSample {registered}, not {given}"
                        ),
                    )
                    .with_value(given)
                    .with_suggestions([registered]),
                );
            }
        }
    }
}

/// Parse a 1-based coordinate; unparsable values are reported and skipped.
fn parse_coordinate(
    record: &SubmissionRecord,
    field: &str,
    result: &mut ValidationResult,
) -> Option<u64> {
    let value = record.value(field)?;
    match value.parse::<u64>() {
        Ok(pos) => Some(pos),
        Err(_) => {
            result.push(
                Finding::new(
                    FindingKind::MalformedCoordinate,
                    Severity::Error,
                    field,
                    format!("'{value}' is not a valid coordinate"),
                )
                .with_value(value),
            );
            None
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split([',', ';']).map(str::trim).filter(|v| !v.is_empty())
}
