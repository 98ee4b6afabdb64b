//! Error types for the JVar reference engine.

use std::path::PathBuf;
use thiserror::Error;

use crate::bio::TaxonomyAxis;
use crate::record::RecordType;

/// Fatal error raised while loading reference tables.
///
/// A store is never returned in a partially loaded state; any of these
/// aborts the load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Error reading a table from disk.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required table is absent from the reference source.
    #[error("Missing reference table: {0}")]
    MissingTable(String),

    /// JSON table could not be parsed.
    #[error("JSON error in {table}: {source}")]
    Json {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// TSV table could not be parsed.
    #[error("CSV error in {table}: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    /// A row holds a value that cannot be interpreted.
    #[error("Malformed row {row} in {table}: {message}")]
    Malformed {
        table: &'static str,
        row: usize,
        message: String,
    },

    /// A key that must be unique appears more than once.
    #[error("Duplicate key in {table}: {key}")]
    Duplicate { table: &'static str, key: String },

    /// A cross-table consistency rule is broken.
    #[error("Invariant violated in {table}: {message}")]
    Invariant {
        table: &'static str,
        message: String,
    },
}

/// Error returned by a single resolver or validator operation.
///
/// Lookup failures are always recoverable; the orchestrator converts them
/// into findings instead of propagating them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unknown assembly: '{0}'")]
    UnknownAssembly(String),

    #[error("Unknown sequence '{name}' in assembly {assembly}")]
    UnknownSequence { assembly: String, name: String },

    #[error("Unknown call type: '{0}'")]
    UnknownCallType(String),

    #[error("Unknown region type: '{0}'")]
    UnknownRegionType(String),

    #[error("Unknown sample: '{0}'")]
    UnknownSample(String),

    /// Value outside the closed vocabulary for a field.
    #[error("Invalid value '{value}' for {record_type} field '{field}'")]
    InvalidVocabularyValue {
        record_type: RecordType,
        field: String,
        value: String,
        suggestions: Vec<String>,
    },

    /// Call type cannot be used as evidence for the region type.
    #[error("Call type '{call_type}' does not support region type '{region_type}'")]
    IncompatibleCallRegionPair {
        call_type: String,
        region_type: String,
    },

    /// Call type has no registered default region type.
    #[error("No default region type registered for call type '{0}'")]
    AmbiguousOrUnknownMapping(String),

    /// Coordinates fall outside `[1, length]` or are inverted.
    #[error("Coordinates {start}..{stop} out of range for {sequence} (length {length})")]
    CoordinateOutOfRange {
        sequence: String,
        start: u64,
        stop: u64,
        length: u64,
    },
}

impl ResolveError {
    /// Build the not-found error matching a taxonomy axis.
    pub(crate) fn unknown_label(axis: TaxonomyAxis, label: &str) -> Self {
        match axis {
            TaxonomyAxis::CallType => ResolveError::UnknownCallType(label.to_string()),
            TaxonomyAxis::RegionType => ResolveError::UnknownRegionType(label.to_string()),
        }
    }
}

/// Result type alias for resolver operations.
pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
