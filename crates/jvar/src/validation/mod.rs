//! Validation of submission records against the reference data.

mod finding;
mod validator;

pub use finding::{Finding, FindingKind, Severity, ValidationResult};
pub use validator::{SubmissionRecordValidator, ValidatorConfig};
