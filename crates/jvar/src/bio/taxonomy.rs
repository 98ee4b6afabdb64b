//! Variant type taxonomy: Call Type and Region Type axes.
//!
//! This module provides canonicalization of dbVar variant type labels, their
//! Sequence Ontology cross-references, and the rules linking experimental
//! call types to the region types they may support.
//!
//! Two indexes describe the call ⇄ region relationship:
//!
//! 1. **Roll-up**: each call type maps to one default region type
//!    ("Alu deletion" → "mobile element deletion").
//! 2. **Linkage**: aggregate region types list every call type accepted as
//!    supporting evidence ("copy number variation" accepts gains, losses,
//!    deletions and duplications).
//!
//! ```ignore
//! use jvar::bio::VariantTypeResolver;
//!
//! let resolver = VariantTypeResolver::new(store);
//! let region = resolver.derive_region_type_for_call("Alu deletion")?;
//! assert_eq!(region.normalized_label, "mobile element deletion");
//! ```

use std::collections::HashMap;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, ResolveError, Result};
use crate::store::ReferenceDataStore;
use crate::tables::{VARIANT_TYPES, VariantTypeRow, VariantTypeTable};

/// Sequence Ontology accession: `SO:` followed by seven digits.
static SO_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^SO:\d{7}$").unwrap());

/// Axis of the variant type taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxonomyAxis {
    CallType,
    RegionType,
}

impl TaxonomyAxis {
    /// Field label used in submission sheets.
    pub fn label(&self) -> &'static str {
        match self {
            TaxonomyAxis::CallType => "Call Type",
            TaxonomyAxis::RegionType => "Region Type",
        }
    }
}

impl fmt::Display for TaxonomyAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A registered variant type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantTypeEntry {
    /// Axis this entry belongs to.
    pub axis: TaxonomyAxis,
    /// Label as shown to submitters (e.g. "Alu deletion").
    pub display_label: String,
    /// Canonical lowercase label (e.g. "alu deletion").
    pub normalized_label: String,
    /// Sequence Ontology identifier (e.g. "SO:0002070").
    pub so_id: String,
}

/// Indexed taxonomy with roll-up and linkage maps.
#[derive(Debug, Clone)]
pub struct VariantTaxonomy {
    /// Call types by normalized label, in table order.
    call_types: IndexMap<String, VariantTypeEntry>,
    /// Region types by normalized label, in table order.
    region_types: IndexMap<String, VariantTypeEntry>,
    /// Aggregate region → accepted supporting call types.
    linkage: HashMap<String, IndexSet<String>>,
    /// Call type → default region type.
    default_region: HashMap<String, String>,
}

impl VariantTaxonomy {
    pub(crate) fn from_table(table: VariantTypeTable) -> std::result::Result<Self, LoadError> {
        let call_types = index_axis(TaxonomyAxis::CallType, table.call_types, 0)?;
        let offset = call_types.len();
        let region_types = index_axis(TaxonomyAxis::RegionType, table.region_types, offset)?;

        let mut linkage = HashMap::new();
        for (region, calls) in table.linkage {
            let region = normalize(&region);
            if !region_types.contains_key(&region) {
                return Err(unknown_reference("linkage", TaxonomyAxis::RegionType, &region));
            }
            let mut members = IndexSet::new();
            for call in calls {
                let call = normalize(&call);
                if !call_types.contains_key(&call) {
                    return Err(unknown_reference("linkage", TaxonomyAxis::CallType, &call));
                }
                members.insert(call);
            }
            linkage.insert(region, members);
        }

        let mut default_region = HashMap::new();
        for (call, region) in table.default_region {
            let call = normalize(&call);
            let region = normalize(&region);
            if !call_types.contains_key(&call) {
                return Err(unknown_reference("roll-up", TaxonomyAxis::CallType, &call));
            }
            if !region_types.contains_key(&region) {
                return Err(unknown_reference("roll-up", TaxonomyAxis::RegionType, &region));
            }
            if linkage
                .get(&region)
                .is_some_and(|members: &IndexSet<String>| !members.contains(&call))
            {
                return Err(LoadError::Invariant {
                    table: VARIANT_TYPES,
                    message: format!(
                        "call type '{call}' rolls up to aggregate region '{region}' but is not in its linkage set"
                    ),
                });
            }
            default_region.insert(call, region);
        }

        Ok(Self {
            call_types,
            region_types,
            linkage,
            default_region,
        })
    }

    fn axis(&self, axis: TaxonomyAxis) -> &IndexMap<String, VariantTypeEntry> {
        match axis {
            TaxonomyAxis::CallType => &self.call_types,
            TaxonomyAxis::RegionType => &self.region_types,
        }
    }

    /// Look up an entry; case-insensitive on the display label.
    pub fn get(&self, axis: TaxonomyAxis, label: &str) -> Option<&VariantTypeEntry> {
        self.axis(axis).get(&normalize(label))
    }

    /// All entries of an axis in table order.
    pub fn entries(&self, axis: TaxonomyAxis) -> impl Iterator<Item = &VariantTypeEntry> {
        self.axis(axis).values()
    }

    pub fn len(&self, axis: TaxonomyAxis) -> usize {
        self.axis(axis).len()
    }

    /// Number of aggregate region types.
    pub fn aggregate_count(&self) -> usize {
        self.linkage.len()
    }
}

fn index_axis(
    axis: TaxonomyAxis,
    rows: Vec<VariantTypeRow>,
    row_offset: usize,
) -> std::result::Result<IndexMap<String, VariantTypeEntry>, LoadError> {
    let mut entries = IndexMap::new();

    for (idx, row) in rows.into_iter().enumerate() {
        let row_number = row_offset + idx + 1;
        let display_label = row.label.trim().to_string();
        let normalized_label = row.normalized.trim().to_string();
        let so_id = row.so_id.trim().to_string();

        if !SO_ID_PATTERN.is_match(&so_id) {
            return Err(LoadError::Malformed {
                table: VARIANT_TYPES,
                row: row_number,
                message: format!("'{so_id}' is not a Sequence Ontology identifier"),
            });
        }
        if normalized_label != display_label.to_lowercase() {
            return Err(LoadError::Invariant {
                table: VARIANT_TYPES,
                message: format!(
                    "normalized label '{normalized_label}' does not match display label '{display_label}'"
                ),
            });
        }
        if entries.contains_key(&normalized_label) {
            return Err(LoadError::Duplicate {
                table: VARIANT_TYPES,
                key: format!("{axis}/{normalized_label}"),
            });
        }

        entries.insert(
            normalized_label.clone(),
            VariantTypeEntry {
                axis,
                display_label,
                normalized_label,
                so_id,
            },
        );
    }

    if entries.is_empty() {
        return Err(LoadError::Invariant {
            table: VARIANT_TYPES,
            message: format!("no {axis} entries"),
        });
    }
    Ok(entries)
}

fn unknown_reference(map: &str, axis: TaxonomyAxis, label: &str) -> LoadError {
    LoadError::Invariant {
        table: VARIANT_TYPES,
        message: format!("{map} references unregistered {axis} '{label}'"),
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Resolves variant type labels and call ⇄ region compatibility.
#[derive(Debug, Clone, Copy)]
pub struct VariantTypeResolver<'a> {
    taxonomy: &'a VariantTaxonomy,
}

impl<'a> VariantTypeResolver<'a> {
    pub fn new(store: &'a ReferenceDataStore) -> Self {
        Self {
            taxonomy: store.taxonomy(),
        }
    }

    fn resolve(&self, axis: TaxonomyAxis, label: &str) -> Result<&'a VariantTypeEntry> {
        self.taxonomy
            .get(axis, label)
            .ok_or_else(|| ResolveError::unknown_label(axis, label.trim()))
    }

    pub fn resolve_call_type(&self, label: &str) -> Result<&'a VariantTypeEntry> {
        self.resolve(TaxonomyAxis::CallType, label)
    }

    pub fn resolve_region_type(&self, label: &str) -> Result<&'a VariantTypeEntry> {
        self.resolve(TaxonomyAxis::RegionType, label)
    }

    /// Default region type a call type rolls up to.
    ///
    /// Fails with `UnknownCallType` for unregistered labels and with
    /// `AmbiguousOrUnknownMapping` for a registered call type without a roll-up.
    pub fn derive_region_type_for_call(&self, call_type: &str) -> Result<&'a VariantTypeEntry> {
        let call = self.resolve_call_type(call_type)?;
        let region = self
            .taxonomy
            .default_region
            .get(&call.normalized_label)
            .ok_or_else(|| ResolveError::AmbiguousOrUnknownMapping(call.normalized_label.clone()))?;
        self.resolve_region_type(region)
    }

    /// Check that a call type may support a region type.
    ///
    /// Aggregate regions accept the members of their linkage set; every
    /// other region only accepts the call types rolling up to it.
    pub fn validate_call_supports_region(&self, call_type: &str, region_type: &str) -> Result<()> {
        let call = self.resolve_call_type(call_type)?;
        let region = self.resolve_region_type(region_type)?;

        let supported = match self.taxonomy.linkage.get(&region.normalized_label) {
            Some(members) => members.contains(&call.normalized_label),
            None => self
                .taxonomy
                .default_region
                .get(&call.normalized_label)
                .is_some_and(|r| *r == region.normalized_label),
        };

        if supported {
            Ok(())
        } else {
            Err(ResolveError::IncompatibleCallRegionPair {
                call_type: call.normalized_label.clone(),
                region_type: region.normalized_label.clone(),
            })
        }
    }

    /// SO identifier of a registered label.
    pub fn resolve_so_identifier(&self, axis: TaxonomyAxis, label: &str) -> Result<&'a str> {
        self.resolve(axis, label).map(|e| e.so_id.as_str())
    }

    /// Whether a region type aggregates several call types.
    pub fn is_aggregate(&self, region_type: &str) -> Result<bool> {
        let region = self.resolve_region_type(region_type)?;
        Ok(self.taxonomy.linkage.contains_key(&region.normalized_label))
    }

    /// Call types accepted as supporting evidence for a region type.
    pub fn call_types_for_region(&self, region_type: &str) -> Result<Vec<&'a VariantTypeEntry>> {
        let region = self.resolve_region_type(region_type)?;
        let taxonomy = self.taxonomy;

        let calls = match taxonomy.linkage.get(&region.normalized_label) {
            Some(members) => members
                .iter()
                .filter_map(|c| taxonomy.call_types.get(c))
                .collect(),
            None => taxonomy
                .call_types
                .values()
                .filter(|c| {
                    taxonomy
                        .default_region
                        .get(&c.normalized_label)
                        .is_some_and(|r| *r == region.normalized_label)
                })
                .collect(),
        };
        Ok(calls)
    }

    /// All entries of an axis.
    pub fn entries(&self, axis: TaxonomyAxis) -> impl Iterator<Item = &'a VariantTypeEntry> {
        self.taxonomy.entries(axis)
    }
}
