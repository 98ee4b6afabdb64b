//! Sample registry: internal sample identifiers to BioSample accessions.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LoadError, ResolveError, Result};
use crate::store::ReferenceDataStore;
use crate::tables::{SAMPLES, SampleRow, defined};

/// Biological sex as recorded for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
    Unknown,
}

impl Sex {
    /// Normalize a free-text registry value. Empty text means no value.
    pub fn normalize(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match value.to_lowercase().as_str() {
            "female" | "f" => Some(Sex::Female),
            "male" | "m" => Some(Sex::Male),
            "unknown" | "u" | "not known" | "not provided" => Some(Sex::Unknown),
            _ => {
                debug!(value, "Unrecognized sex value, recording as Unknown");
                Some(Sex::Unknown)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
            Sex::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a sex lookup for a registered sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SexCall {
    Recorded(Sex),
    /// The registry holds no sex attribute for the sample.
    Unspecified,
}

/// A registered sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRecord {
    pub sample_id: String,
    pub biosample_accession: Option<String>,
    pub sex: Option<Sex>,
    pub population: Option<String>,
}

/// Indexed sample registry.
#[derive(Debug, Clone, Default)]
pub struct SampleRegistry {
    samples: IndexMap<String, SampleRecord>,
    /// Uppercase BioSample accession → sample ID.
    by_biosample: HashMap<String, String>,
}

impl SampleRegistry {
    pub(crate) fn from_rows(rows: Vec<SampleRow>) -> std::result::Result<Self, LoadError> {
        let mut registry = Self::default();

        for (idx, row) in rows.into_iter().enumerate() {
            let sample_id = row.sample_id.trim().to_string();
            if sample_id.is_empty() {
                return Err(LoadError::Malformed {
                    table: SAMPLES,
                    row: idx + 1,
                    message: "empty sample ID".to_string(),
                });
            }
            if registry.samples.contains_key(&sample_id) {
                return Err(LoadError::Duplicate {
                    table: SAMPLES,
                    key: sample_id,
                });
            }

            let biosample_accession = defined(row.biosample_accession);
            if let Some(accession) = &biosample_accession {
                let previous = registry
                    .by_biosample
                    .insert(accession.to_uppercase(), sample_id.clone());
                if let Some(other) = previous {
                    return Err(LoadError::Invariant {
                        table: SAMPLES,
                        message: format!(
                            "BioSample {accession} is shared by samples {other} and {sample_id}"
                        ),
                    });
                }
            }

            let record = SampleRecord {
                sample_id: sample_id.clone(),
                biosample_accession,
                sex: row.sex.as_deref().and_then(Sex::normalize),
                population: defined(row.population),
            };
            registry.samples.insert(sample_id, record);
        }

        Ok(registry)
    }

    pub fn get(&self, sample_id: &str) -> Option<&SampleRecord> {
        self.samples.get(sample_id.trim())
    }

    /// Sample registered under a BioSample accession.
    pub fn by_biosample(&self, accession: &str) -> Option<&SampleRecord> {
        let sample_id = self.by_biosample.get(&accession.trim().to_uppercase())?;
        self.samples.get(sample_id)
    }

    pub fn samples(&self) -> impl Iterator<Item = &SampleRecord> {
        self.samples.values()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Resolves sample identifiers against the registry.
#[derive(Debug, Clone, Copy)]
pub struct SampleResolver<'a> {
    registry: &'a SampleRegistry,
}

impl<'a> SampleResolver<'a> {
    pub fn new(store: &'a ReferenceDataStore) -> Self {
        Self {
            registry: store.samples(),
        }
    }

    pub fn resolve_sample(&self, sample_id: &str) -> Result<&'a SampleRecord> {
        self.registry
            .get(sample_id)
            .ok_or_else(|| ResolveError::UnknownSample(sample_id.trim().to_string()))
    }

    /// Sex of a registered sample; `Unspecified` when none was recorded.
    pub fn resolve_sex(&self, sample_id: &str) -> Result<SexCall> {
        let sample = self.resolve_sample(sample_id)?;
        Ok(sample.sex.map_or(SexCall::Unspecified, SexCall::Recorded))
    }

    pub fn resolve_biosample(&self, sample_id: &str) -> Result<Option<&'a str>> {
        let sample = self.resolve_sample(sample_id)?;
        Ok(sample.biosample_accession.as_deref())
    }
}
