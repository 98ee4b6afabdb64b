//! JVar: variant taxonomy and reference resolution engine.
//!
//! The engine validates genomic-variant submission metadata against a fixed
//! release of reference data: controlled vocabularies per record type, the
//! dbVar variant type taxonomy with Sequence Ontology cross-references,
//! human reference assemblies and their sequences, and a sample registry.
//!
//! # Core Principles
//!
//! - **Load once**: reference tables are read and indexed once, then shared read-only
//! - **Collect everything**: record validation reports every problem, never only the first
//! - **No guessing**: unknown labels and identifiers fail; nothing is fabricated
//!
//! # Example
//!
//! ```no_run
//! use jvar::{RecordType, ReferenceDataStore, SubmissionRecord, SubmissionRecordValidator};
//!
//! let store = ReferenceDataStore::embedded();
//! let validator = SubmissionRecordValidator::new(store);
//!
//! let record = SubmissionRecord::new(RecordType::VariantCall)
//!     .with_field("Call Type", "Alu deletion")
//!     .with_field("Assembly", "GRCh38")
//!     .with_field("Chr", "1")
//!     .with_field("Start", "100")
//!     .with_field("Stop", "200");
//!
//! let result = validator.validate(&record);
//! println!("Errors: {}", result.errors.len());
//! ```

pub mod bio;
pub mod error;
pub mod validation;

mod record;
mod store;
mod tables;

pub use error::{LoadError, ResolveError, Result};
pub use record::{RecordType, SubmissionRecord};
pub use store::{ReferenceDataStore, ReferenceStats};
pub use tables::ReferenceSource;
pub use validation::{
    Finding, FindingKind, Severity, SubmissionRecordValidator, ValidationResult, ValidatorConfig,
};
