//! Reference resolvers for JVar submission metadata.
//!
//! This module provides the lookups a submission pipeline needs against the
//! loaded reference data, including:
//!
//! - Controlled vocabulary and required-field checks per record type
//! - Variant type taxonomy (Call Type / Region Type) with SO cross-references
//! - Genome assembly and sequence identifier cross-walks (RefSeq, GenBank, UCSC)
//! - Sample to BioSample resolution
//!
//! # Example
//!
//! ```ignore
//! use jvar::ReferenceDataStore;
//! use jvar::bio::{AssemblyResolver, VariantTypeResolver};
//!
//! let store = ReferenceDataStore::embedded();
//! let chr1 = AssemblyResolver::new(store).resolve_sequence("GRCh38", "chr1")?;
//! let so_id = VariantTypeResolver::new(store)
//!     .resolve_so_identifier(TaxonomyAxis::CallType, "deletion")?;
//! ```

mod assembly;
mod sample;
mod taxonomy;
mod vocabulary;

pub use assembly::{
    AssemblyCatalog, AssemblyRecord, AssemblyResolver, AssemblyUnit, GrchLineage, SequenceRecord,
    SequenceRole,
};
pub use sample::{SampleRecord, SampleRegistry, SampleResolver, Sex, SexCall};
pub use taxonomy::{TaxonomyAxis, VariantTaxonomy, VariantTypeEntry, VariantTypeResolver};
pub use vocabulary::{
    ControlledVocabulary, MissingField, RequiredFieldPolicy, VocabularyCatalog, VocabularyValidator,
};
