//! Immutable in-memory reference data store.
//!
//! The store is loaded once from a [`ReferenceSource`] and never mutated.
//! All secondary indexes are built during the load, so lookups never touch
//! the filesystem. A load either succeeds completely or returns a
//! [`LoadError`]; partially loaded stores are never handed out.
//!
//! ```ignore
//! use jvar::{ReferenceDataStore, ReferenceSource};
//!
//! // Built-in tables, loaded once per process
//! let store = ReferenceDataStore::embedded();
//!
//! // Or a newer release on disk
//! let store = ReferenceDataStore::load(ReferenceSource::directory("reference/2024-06"))?;
//! ```

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{info, info_span};

use crate::bio::{
    AssemblyCatalog, AssemblyRecord, ControlledVocabulary, RequiredFieldPolicy, SampleRecord,
    SampleRegistry, SequenceRecord, TaxonomyAxis, VariantTaxonomy, VariantTypeEntry,
    VocabularyCatalog,
};
use crate::error::LoadError;
use crate::record::RecordType;
use crate::tables::{ReferenceSource, VOCABULARIES};

static EMBEDDED: Lazy<Result<ReferenceDataStore, LoadError>> =
    Lazy::new(|| ReferenceDataStore::load(ReferenceSource::Embedded));

/// Statistics about a loaded store.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceStats {
    /// Number of closed vocabularies.
    pub vocabulary_count: usize,
    pub call_type_count: usize,
    pub region_type_count: usize,
    pub assembly_count: usize,
    pub sequence_count: usize,
    pub sample_count: usize,
    /// Where the tables were read from.
    pub source: String,
    /// SHA-256 over the raw tables.
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
}

/// Read-only reference data shared by every resolver.
#[derive(Debug, Clone)]
pub struct ReferenceDataStore {
    vocabularies: VocabularyCatalog,
    taxonomy: VariantTaxonomy,
    assemblies: AssemblyCatalog,
    samples: SampleRegistry,
    stats: ReferenceStats,
}

impl ReferenceDataStore {
    /// Load and index every reference table of a source.
    pub fn load(source: ReferenceSource) -> Result<Self, LoadError> {
        let span = info_span!("load_reference", source = %source);
        let _guard = span.enter();

        let tables = source.read()?;
        let fingerprint = tables.fingerprint();

        let vocabularies = VocabularyCatalog::from_table(tables.vocabulary_table()?)?;
        let taxonomy = VariantTaxonomy::from_table(tables.variant_type_table()?)?;
        let assemblies =
            AssemblyCatalog::from_tables(tables.assembly_table()?, tables.sequence_rows()?)?;
        let samples = SampleRegistry::from_rows(tables.sample_rows()?)?;

        check_taxonomy_vocabularies(&vocabularies, &taxonomy)?;

        let stats = ReferenceStats {
            vocabulary_count: vocabularies.len(),
            call_type_count: taxonomy.len(TaxonomyAxis::CallType),
            region_type_count: taxonomy.len(TaxonomyAxis::RegionType),
            assembly_count: assemblies.len(),
            sequence_count: assemblies.sequence_count(),
            sample_count: samples.len(),
            source: source.to_string(),
            fingerprint,
            loaded_at: Utc::now(),
        };

        info!(
            vocabularies = stats.vocabulary_count,
            call_types = stats.call_type_count,
            region_types = stats.region_type_count,
            assemblies = stats.assembly_count,
            sequences = stats.sequence_count,
            samples = stats.sample_count,
            fingerprint = %stats.fingerprint,
            "Loaded reference data"
        );

        Ok(Self {
            vocabularies,
            taxonomy,
            assemblies,
            samples,
            stats,
        })
    }

    /// The store built from the embedded tables, loaded on first use.
    pub fn try_embedded() -> Result<&'static Self, &'static LoadError> {
        (*EMBEDDED).as_ref()
    }

    /// The store built from the embedded tables.
    ///
    /// # Panics
    ///
    /// Panics if the embedded tables fail to load. The tables ship with the
    /// crate and are checked by its test suite; use [`Self::try_embedded`]
    /// to handle the error instead.
    pub fn embedded() -> &'static Self {
        match Self::try_embedded() {
            Ok(store) => store,
            Err(e) => panic!("embedded reference data failed to load: {e}"),
        }
    }

    /// Assembly by RefSeq/INSDC accession, GRCh label or UCSC name.
    pub fn get_assembly(&self, identifier: &str) -> Option<&AssemblyRecord> {
        self.assemblies.get(identifier)
    }

    /// Sequence by accession, UCSC name, sequence name or chromosome name.
    pub fn get_sequence(&self, assembly: &str, name: &str) -> Option<&SequenceRecord> {
        self.assemblies.get_sequence(assembly, name)
    }

    /// Closed vocabulary of a field; `None` means free text is allowed.
    pub fn get_vocabulary(
        &self,
        record_type: RecordType,
        field: &str,
    ) -> Option<&ControlledVocabulary> {
        self.vocabularies.get(record_type, field)
    }

    pub fn get_required_fields(&self, record_type: RecordType) -> &RequiredFieldPolicy {
        self.vocabularies.policy(record_type)
    }

    pub fn get_variant_type_entry(
        &self,
        axis: TaxonomyAxis,
        label: &str,
    ) -> Option<&VariantTypeEntry> {
        self.taxonomy.get(axis, label)
    }

    pub fn get_sample(&self, sample_id: &str) -> Option<&SampleRecord> {
        self.samples.get(sample_id)
    }

    pub fn vocabularies(&self) -> &VocabularyCatalog {
        &self.vocabularies
    }

    pub fn taxonomy(&self) -> &VariantTaxonomy {
        &self.taxonomy
    }

    pub fn assemblies(&self) -> &AssemblyCatalog {
        &self.assemblies
    }

    pub fn samples(&self) -> &SampleRegistry {
        &self.samples
    }

    pub fn stats(&self) -> &ReferenceStats {
        &self.stats
    }
}

/// Every value of the Call Type / Region Type vocabularies must be a registered label.
fn check_taxonomy_vocabularies(
    vocabularies: &VocabularyCatalog,
    taxonomy: &VariantTaxonomy,
) -> Result<(), LoadError> {
    let axes = [
        (RecordType::VariantCall, TaxonomyAxis::CallType),
        (RecordType::VariantRegion, TaxonomyAxis::RegionType),
    ];

    for (record_type, axis) in axes {
        let Some(vocabulary) = vocabularies.get(record_type, axis.label()) else {
            continue;
        };
        if let Some(value) = vocabulary.values().find(|v| taxonomy.get(axis, v).is_none()) {
            return Err(LoadError::Invariant {
                table: VOCABULARIES,
                message: format!("{axis} vocabulary lists unregistered label '{value}'"),
            });
        }
    }
    Ok(())
}
