//! dbVar Variant Type Conformance Tests
//!
//! These tests check the shipped variant type taxonomy against the dbVar
//! variant type list and its Sequence Ontology cross-references.
//!
//! Reference: https://www.ncbi.nlm.nih.gov/dbvar/content/overview/#variant_types
//!
//! # Test Categories
//!
//! 1. Call types with SO identifiers (24)
//! 2. Region types with SO identifiers (13)
//! 3. Default roll-up of call types
//! 4. Aggregate region linkage

use jvar::ReferenceDataStore;
use jvar::bio::{TaxonomyAxis, VariantTypeResolver};

// =============================================================================
// dbVar Reference Data
// =============================================================================

/// dbVar call types and their SO identifiers.
const DBVAR_CALL_TYPES: &[(&str, &str)] = &[
    ("alu deletion", "SO:0002070"),
    ("herv deletion", "SO:0002067"),
    ("line1 deletion", "SO:0002069"),
    ("sva deletion", "SO:0002068"),
    ("mobile element deletion", "SO:0002066"),
    ("alu insertion", "SO:0002063"),
    ("herv insertion", "SO:0002187"),
    ("line1 insertion", "SO:0002064"),
    ("sva insertion", "SO:0002065"),
    ("mobile element insertion", "SO:0001837"),
    ("copy number variation", "SO:0001019"),
    ("copy number gain", "SO:0001742"),
    ("copy number loss", "SO:0001743"),
    ("deletion", "SO:0000159"),
    ("duplication", "SO:1000035"),
    ("tandem duplication", "SO:1000173"),
    ("insertion", "SO:0000667"),
    ("novel sequence insertion", "SO:0001838"),
    ("inversion", "SO:1000036"),
    ("indel", "SO:1000032"),
    ("interchromosomal translocation", "SO:0002060"),
    ("intrachromosomal translocation", "SO:0002061"),
    ("sequence alteration", "SO:0001059"),
    ("short tandem repeat variation", "SO:0002096"),
];

/// dbVar region types and their SO identifiers.
const DBVAR_REGION_TYPES: &[(&str, &str)] = &[
    ("complex chromosomal rearrangement", "SO:0002062"),
    ("complex substitution", "SO:1000005"),
    ("copy number variation", "SO:0001019"),
    ("indel", "SO:1000032"),
    ("insertion", "SO:0000667"),
    ("inversion", "SO:1000036"),
    ("mobile element deletion", "SO:0002066"),
    ("mobile element insertion", "SO:0001837"),
    ("novel sequence insertion", "SO:0001838"),
    ("sequence alteration", "SO:0001059"),
    ("short tandem repeat variation", "SO:0002096"),
    ("tandem duplication", "SO:1000173"),
    ("translocation", "SO:0000199"),
];

/// Region types that aggregate several call types.
const DBVAR_AGGREGATE_REGIONS: &[&str] = &[
    "copy number variation",
    "mobile element insertion",
    "mobile element deletion",
    "translocation",
    "complex chromosomal rearrangement",
];

fn resolver() -> VariantTypeResolver<'static> {
    VariantTypeResolver::new(ReferenceDataStore::embedded())
}

// =============================================================================
// Axis Tests
// =============================================================================

#[test]
fn test_call_type_count() {
    assert_eq!(
        resolver().entries(TaxonomyAxis::CallType).count(),
        DBVAR_CALL_TYPES.len(),
        "taxonomy should register exactly the dbVar call types"
    );
}

#[test]
fn test_call_type_so_identifiers() {
    let resolver = resolver();
    for (label, so_id) in DBVAR_CALL_TYPES {
        let entry = resolver
            .resolve_call_type(label)
            .unwrap_or_else(|_| panic!("missing call type '{label}'"));
        assert_eq!(entry.so_id, *so_id, "wrong SO identifier for '{label}'");
    }
}

#[test]
fn test_region_type_count() {
    assert_eq!(
        resolver().entries(TaxonomyAxis::RegionType).count(),
        DBVAR_REGION_TYPES.len()
    );
}

#[test]
fn test_region_type_so_identifiers() {
    let resolver = resolver();
    for (label, so_id) in DBVAR_REGION_TYPES {
        let entry = resolver
            .resolve_region_type(label)
            .unwrap_or_else(|_| panic!("missing region type '{label}'"));
        assert_eq!(entry.so_id, *so_id, "wrong SO identifier for '{label}'");
    }
}

#[test]
fn test_mobile_element_subtypes_per_direction() {
    let resolver = resolver();
    for direction in ["deletion", "insertion"] {
        for element in ["Alu", "HERV", "LINE1", "SVA"] {
            let label = format!("{element} {direction}");
            let entry = resolver.resolve_call_type(&label).unwrap();
            assert_eq!(entry.display_label, label);

            let region = resolver.derive_region_type_for_call(&label).unwrap();
            assert_eq!(region.normalized_label, format!("mobile element {direction}"));
        }
    }
}

// =============================================================================
// Roll-up and Linkage Tests
// =============================================================================

#[test]
fn test_copy_number_roll_up() {
    let resolver = resolver();
    for call in ["copy number gain", "copy number loss", "deletion", "duplication"] {
        assert_eq!(
            resolver.derive_region_type_for_call(call).unwrap().normalized_label,
            "copy number variation"
        );
    }
}

#[test]
fn test_translocation_roll_up() {
    let resolver = resolver();
    for call in ["interchromosomal translocation", "intrachromosomal translocation"] {
        assert_eq!(
            resolver.derive_region_type_for_call(call).unwrap().normalized_label,
            "translocation"
        );
    }
}

#[test]
fn test_aggregate_regions() {
    let resolver = resolver();
    for region in DBVAR_AGGREGATE_REGIONS {
        assert!(resolver.is_aggregate(region).unwrap(), "'{region}' should aggregate");
        assert!(!resolver.call_types_for_region(region).unwrap().is_empty());
    }
}

#[test]
fn test_one_to_one_regions_accept_their_own_call() {
    let resolver = resolver();
    for region in ["inversion", "tandem duplication", "novel sequence insertion", "indel"] {
        assert!(resolver.validate_call_supports_region(region, region).is_ok());
    }
}

#[test]
fn test_complex_substitution_support() {
    let resolver = resolver();
    assert!(resolver.validate_call_supports_region("indel", "complex substitution").is_ok());
    assert!(
        resolver
            .validate_call_supports_region("sequence alteration", "complex substitution")
            .is_ok()
    );
    assert!(
        resolver
            .validate_call_supports_region("deletion", "complex substitution")
            .is_err()
    );
}
