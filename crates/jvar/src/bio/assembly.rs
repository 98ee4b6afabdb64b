//! Genome assembly and sequence identifier resolution.
//!
//! Human reference assemblies are named by several independent systems:
//!
//! - RefSeq assembly accession (`GCF_000001405.40`)
//! - INSDC/GenBank assembly accession (`GCA_000001405.29`)
//! - GRCh version label (`GRCh38.p14`) and short name (`GRCh38`)
//! - UCSC build name (`hg38`)
//!
//! Sequences inside an assembly are likewise reachable by RefSeq accession,
//! GenBank accession, UCSC-style name, assembly-report sequence name, or (for
//! assembled molecules) bare chromosome name.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, ResolveError, Result};
use crate::store::ReferenceDataStore;
use crate::tables::{ASSEMBLIES, AssemblyTable, SEQUENCES, SequenceRow, defined};

/// Chromosome names an assembled molecule may carry.
const CHROMOSOME_NAMES: [&str; 27] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "MT", "M", "UN",
];

/// GRCh lineage of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrchLineage {
    #[serde(rename = "GRCh37")]
    Grch37,
    #[serde(rename = "GRCh38")]
    Grch38,
}

impl GrchLineage {
    /// Infer the lineage from a version label such as `GRCh38.p14`.
    pub fn from_version(version: &str) -> Option<Self> {
        let version = version.trim().to_uppercase();
        if version.starts_with("GRCH37") {
            Some(GrchLineage::Grch37)
        } else if version.starts_with("GRCH38") {
            Some(GrchLineage::Grch38)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GrchLineage::Grch37 => "GRCh37",
            GrchLineage::Grch38 => "GRCh38",
        }
    }
}

impl fmt::Display for GrchLineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sequence role as reported by NCBI assembly reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequenceRole {
    AssembledMolecule,
    UnlocalizedScaffold,
    UnplacedScaffold,
    FixPatch,
    NovelPatch,
    AltScaffold,
}

impl SequenceRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "assembled-molecule" => Some(SequenceRole::AssembledMolecule),
            "unlocalized-scaffold" => Some(SequenceRole::UnlocalizedScaffold),
            "unplaced-scaffold" => Some(SequenceRole::UnplacedScaffold),
            "fix-patch" => Some(SequenceRole::FixPatch),
            "novel-patch" => Some(SequenceRole::NovelPatch),
            "alt-scaffold" => Some(SequenceRole::AltScaffold),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SequenceRole::AssembledMolecule => "assembled-molecule",
            SequenceRole::UnlocalizedScaffold => "unlocalized-scaffold",
            SequenceRole::UnplacedScaffold => "unplaced-scaffold",
            SequenceRole::FixPatch => "fix-patch",
            SequenceRole::NovelPatch => "novel-patch",
            SequenceRole::AltScaffold => "alt-scaffold",
        }
    }

    /// Whether the role is a patch release sequence.
    pub fn is_patch(&self) -> bool {
        matches!(self, SequenceRole::FixPatch | SequenceRole::NovelPatch)
    }
}

impl fmt::Display for SequenceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named partition of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssemblyUnit {
    PrimaryAssembly,
    Patches,
    /// `ALT_REF_LOCI_n`
    AltRefLoci(u32),
    NonNuclear,
}

impl AssemblyUnit {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "primary assembly" => Some(AssemblyUnit::PrimaryAssembly),
            "patches" => Some(AssemblyUnit::Patches),
            "non-nuclear" => Some(AssemblyUnit::NonNuclear),
            other => other
                .strip_prefix("alt_ref_loci_")
                .and_then(|n| n.parse().ok())
                .map(AssemblyUnit::AltRefLoci),
        }
    }
}

impl fmt::Display for AssemblyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyUnit::PrimaryAssembly => f.write_str("Primary Assembly"),
            AssemblyUnit::Patches => f.write_str("PATCHES"),
            AssemblyUnit::AltRefLoci(n) => write!(f, "ALT_REF_LOCI_{n}"),
            AssemblyUnit::NonNuclear => f.write_str("non-nuclear"),
        }
    }
}

/// A reference assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyRecord {
    /// RefSeq assembly accession (primary key).
    pub refseq_accession: String,
    /// INSDC/GenBank assembly accession.
    pub insdc_accession: String,
    /// Full GRCh version label, e.g. `GRCh38.p14`.
    pub grch_version: String,
    /// Short GRCh label, e.g. `GRCh38`, for the release that owns it.
    pub grch_short_name: Option<String>,
    /// UCSC build name, e.g. `hg38`.
    pub ucsc_name: Option<String>,
    pub lineage: GrchLineage,
}

impl AssemblyRecord {
    /// Every identifier this assembly answers to.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.refseq_accession.as_str()),
            Some(self.insdc_accession.as_str()),
            Some(self.grch_version.as_str()),
            self.grch_short_name.as_deref(),
            self.ucsc_name.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// A sequence belonging to one assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceRecord {
    /// RefSeq accession of the owning assembly.
    pub assembly_accession: String,
    /// Assembly-report sequence name (e.g. `1`, `HSCHR6_MHC_APD_CTG1`).
    pub sequence_name: String,
    /// Chromosome the sequence is assigned to; `Un` for unplaced scaffolds.
    pub chromosome: String,
    pub genbank_accession: String,
    pub refseq_accession: String,
    pub length: u64,
    pub role: SequenceRole,
    pub unit: AssemblyUnit,
    pub ucsc_name: Option<String>,
    pub gc_percent: Option<f64>,
}

/// Per-assembly sequence indexes.
#[derive(Debug, Clone, Default)]
struct SequenceIndex {
    records: Vec<SequenceRecord>,
    /// Uppercase RefSeq, GenBank, UCSC and sequence names.
    by_accession: HashMap<String, usize>,
    /// Uppercase chromosome name of assembled molecules.
    by_chromosome: HashMap<String, usize>,
}

impl SequenceIndex {
    fn insert_key(&mut self, key: &str, idx: usize) -> std::result::Result<(), LoadError> {
        let key = key.to_uppercase();
        match self.by_accession.get(&key) {
            Some(existing) if *existing != idx => Err(LoadError::Duplicate {
                table: SEQUENCES,
                key: format!("{}/{}", self.records[idx].assembly_accession, key),
            }),
            _ => {
                self.by_accession.insert(key, idx);
                Ok(())
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<&SequenceRecord> {
        let key = name.trim().to_uppercase();
        let idx = chromosome_alias(&key)
            .and_then(|chrom| self.by_chromosome.get(chrom.as_str()))
            .or_else(|| self.by_accession.get(&key))?;
        self.records.get(*idx)
    }
}

/// Bare chromosome name for an uppercase key, accepting `chr` and `M` aliases.
fn chromosome_alias(key: &str) -> Option<String> {
    let bare = key.strip_prefix("CHR").unwrap_or(key);
    match bare {
        "M" => Some("MT".to_string()),
        "" => None,
        other => Some(other.to_string()),
    }
}

/// Indexed assemblies and their sequences.
#[derive(Debug, Clone)]
pub struct AssemblyCatalog {
    /// Assemblies by RefSeq accession, in table order.
    assemblies: IndexMap<String, AssemblyRecord>,
    /// Any uppercase identifier → RefSeq accession.
    by_identifier: HashMap<String, String>,
    sequences: HashMap<String, SequenceIndex>,
}

impl AssemblyCatalog {
    pub(crate) fn from_tables(
        table: AssemblyTable,
        rows: Vec<SequenceRow>,
    ) -> std::result::Result<Self, LoadError> {
        let mut assemblies = IndexMap::new();
        let mut by_identifier: HashMap<String, String> = HashMap::new();

        for (idx, row) in table.assemblies.into_iter().enumerate() {
            let lineage = GrchLineage::from_version(&row.grch_version).ok_or_else(|| {
                LoadError::Malformed {
                    table: ASSEMBLIES,
                    row: idx + 1,
                    message: format!("unknown GRCh lineage '{}'", row.grch_version),
                }
            })?;
            let record = AssemblyRecord {
                refseq_accession: row.refseq_accession.trim().to_string(),
                insdc_accession: row.insdc_accession.trim().to_string(),
                grch_version: row.grch_version.trim().to_string(),
                grch_short_name: defined(row.grch_short_name.map(|s| s.trim().to_string())),
                ucsc_name: defined(row.ucsc_name.map(|s| s.trim().to_string())),
                lineage,
            };

            if assemblies.contains_key(&record.refseq_accession) {
                return Err(LoadError::Duplicate {
                    table: ASSEMBLIES,
                    key: record.refseq_accession,
                });
            }
            for identifier in record.identifiers() {
                let key = identifier.to_uppercase();
                if by_identifier
                    .get(&key)
                    .is_some_and(|owner| *owner != record.refseq_accession)
                {
                    return Err(LoadError::Duplicate {
                        table: ASSEMBLIES,
                        key: identifier.to_string(),
                    });
                }
                by_identifier.insert(key, record.refseq_accession.clone());
            }
            assemblies.insert(record.refseq_accession.clone(), record);
        }

        let mut sequences: HashMap<String, SequenceIndex> = assemblies
            .keys()
            .map(|k| (k.clone(), SequenceIndex::default()))
            .collect();

        for (idx, row) in rows.into_iter().enumerate() {
            let row_number = idx + 1;
            let record = sequence_record(row_number, row)?;
            let index = sequences
                .get_mut(&record.assembly_accession)
                .ok_or_else(|| LoadError::Invariant {
                    table: SEQUENCES,
                    message: format!(
                        "sequence {} references unknown assembly {}",
                        record.refseq_accession, record.assembly_accession
                    ),
                })?;

            let position = index.records.len();
            if index
                .records
                .iter()
                .any(|r| r.refseq_accession.eq_ignore_ascii_case(&record.refseq_accession))
            {
                return Err(LoadError::Duplicate {
                    table: SEQUENCES,
                    key: format!("{}/{}", record.assembly_accession, record.refseq_accession),
                });
            }

            let keys: Vec<String> = [
                Some(record.refseq_accession.clone()),
                Some(record.genbank_accession.clone()),
                Some(record.sequence_name.clone()),
                record.ucsc_name.clone(),
            ]
            .into_iter()
            .flatten()
            .collect();
            let chromosome = (record.role == SequenceRole::AssembledMolecule)
                .then(|| record.chromosome.to_uppercase());

            index.records.push(record);
            for key in &keys {
                index.insert_key(key, position)?;
            }
            if let Some(chromosome) = chromosome {
                let chromosome = if chromosome == "M" { "MT".to_string() } else { chromosome };
                if index.by_chromosome.insert(chromosome.clone(), position).is_some() {
                    return Err(LoadError::Duplicate {
                        table: SEQUENCES,
                        key: format!(
                            "{}/chromosome {}",
                            index.records[position].assembly_accession, chromosome
                        ),
                    });
                }
            }
        }

        Ok(Self {
            assemblies,
            by_identifier,
            sequences,
        })
    }

    /// Assembly by any of its identifiers.
    pub fn get(&self, identifier: &str) -> Option<&AssemblyRecord> {
        let accession = self.by_identifier.get(&identifier.trim().to_uppercase())?;
        self.assemblies.get(accession)
    }

    /// Sequence of an assembly by accession, UCSC name, sequence name or chromosome.
    pub fn get_sequence(&self, assembly: &str, name: &str) -> Option<&SequenceRecord> {
        let record = self.get(assembly)?;
        self.sequences.get(&record.refseq_accession)?.lookup(name)
    }

    /// All sequences of an assembly in table order.
    pub fn sequences_of(&self, assembly: &AssemblyRecord) -> &[SequenceRecord] {
        self.sequences
            .get(&assembly.refseq_accession)
            .map(|index| index.records.as_slice())
            .unwrap_or_default()
    }

    /// All assemblies in table order.
    pub fn assemblies(&self) -> impl Iterator<Item = &AssemblyRecord> {
        self.assemblies.values()
    }

    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }

    /// Total number of sequences across assemblies.
    pub fn sequence_count(&self) -> usize {
        self.sequences.values().map(|index| index.records.len()).sum()
    }
}

fn sequence_record(row: usize, raw: SequenceRow) -> std::result::Result<SequenceRecord, LoadError> {
    let malformed = |message: String| LoadError::Malformed {
        table: SEQUENCES,
        row,
        message,
    };

    let role = SequenceRole::parse(&raw.role)
        .ok_or_else(|| malformed(format!("unknown sequence role '{}'", raw.role)))?;
    let unit = AssemblyUnit::parse(&raw.assembly_unit)
        .ok_or_else(|| malformed(format!("unknown assembly unit '{}'", raw.assembly_unit)))?;

    if raw.length == 0 {
        return Err(malformed(format!("sequence {} has zero length", raw.refseq_accession)));
    }

    let gc_percent = match defined(raw.gc_percent) {
        Some(value) => Some(
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|gc| (0.0..=100.0).contains(gc))
                .ok_or_else(|| malformed(format!("'{value}' is not a GC percentage")))?,
        ),
        None => None,
    };

    let chromosome = defined(raw.assigned_molecule).unwrap_or_else(|| "Un".to_string());
    if role == SequenceRole::AssembledMolecule
        && !CHROMOSOME_NAMES.contains(&chromosome.to_uppercase().as_str())
    {
        return Err(malformed(format!(
            "'{chromosome}' is not a chromosome name for an assembled molecule"
        )));
    }

    Ok(SequenceRecord {
        assembly_accession: raw.assembly_accession,
        sequence_name: raw.sequence_name,
        chromosome,
        genbank_accession: raw.genbank_accession,
        refseq_accession: raw.refseq_accession,
        length: raw.length,
        role,
        unit,
        ucsc_name: defined(raw.ucsc_name),
        gc_percent,
    })
}

/// Resolves assemblies, sequences and coordinates.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyResolver<'a> {
    catalog: &'a AssemblyCatalog,
}

impl<'a> AssemblyResolver<'a> {
    pub fn new(store: &'a ReferenceDataStore) -> Self {
        Self {
            catalog: store.assemblies(),
        }
    }

    /// Resolve an assembly from a RefSeq/INSDC accession, GRCh label or UCSC name.
    pub fn resolve_assembly(&self, identifier: &str) -> Result<&'a AssemblyRecord> {
        self.catalog
            .get(identifier)
            .ok_or_else(|| ResolveError::UnknownAssembly(identifier.trim().to_string()))
    }

    /// Resolve a sequence inside an assembly.
    ///
    /// Bare chromosome names (with or without `chr`) select the assembled
    /// molecule; patch and alt sequences need an accession or name.
    pub fn resolve_sequence(&self, assembly: &str, name: &str) -> Result<&'a SequenceRecord> {
        let record = self.resolve_assembly(assembly)?;
        self.catalog
            .sequences
            .get(&record.refseq_accession)
            .and_then(|index| index.lookup(name))
            .ok_or_else(|| ResolveError::UnknownSequence {
                assembly: record.refseq_accession.clone(),
                name: name.trim().to_string(),
            })
    }

    /// Check that `start..=stop` lies within `[1, length]` of the sequence.
    pub fn validate_coordinate_within_sequence(
        &self,
        sequence: &SequenceRecord,
        start: u64,
        stop: u64,
    ) -> Result<()> {
        if start == 0 || start > stop || stop > sequence.length {
            return Err(ResolveError::CoordinateOutOfRange {
                sequence: sequence.refseq_accession.clone(),
                start,
                stop,
                length: sequence.length,
            });
        }
        Ok(())
    }

    pub fn lineage(&self, assembly: &str) -> Result<GrchLineage> {
        self.resolve_assembly(assembly).map(|a| a.lineage)
    }

    pub fn sequences(&self, assembly: &str) -> Result<&'a [SequenceRecord]> {
        let record = self.resolve_assembly(assembly)?;
        Ok(self.catalog.sequences_of(record))
    }

    pub fn sequences_by_role(
        &self,
        assembly: &str,
        role: SequenceRole,
    ) -> Result<Vec<&'a SequenceRecord>> {
        Ok(self
            .sequences(assembly)?
            .iter()
            .filter(|s| s.role == role)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AssemblyResolver<'static> {
        AssemblyResolver::new(ReferenceDataStore::embedded())
    }

    #[test]
    fn test_assembly_identifier_forms() {
        let resolver = resolver();
        let by_refseq = resolver.resolve_assembly("GCF_000001405.40").unwrap();

        for id in ["GCA_000001405.29", "GRCh38.p14", "GRCh38", "hg38", " HG38 "] {
            assert_eq!(resolver.resolve_assembly(id).unwrap(), by_refseq);
        }
        assert_eq!(by_refseq.lineage, GrchLineage::Grch38);
    }

    #[test]
    fn test_assembly_without_short_name() {
        let resolver = resolver();
        let p13 = resolver.resolve_assembly("GRCh38.p13").unwrap();
        assert_eq!(p13.refseq_accession, "GCF_000001405.39");
        assert!(p13.ucsc_name.is_none());
        assert_eq!(
            resolver.resolve_assembly("hg18"),
            Err(ResolveError::UnknownAssembly("hg18".to_string()))
        );
    }

    #[test]
    fn test_chromosome_aliases() {
        let resolver = resolver();
        let chr1 = resolver.resolve_sequence("GRCh38", "1").unwrap();
        assert_eq!(chr1.refseq_accession, "NC_000001.11");
        assert_eq!(resolver.resolve_sequence("GRCh38", "chr1").unwrap(), chr1);

        let mt = resolver.resolve_sequence("GRCh37", "chrM").unwrap();
        assert_eq!(mt.chromosome, "MT");
        assert_eq!(mt.unit, AssemblyUnit::NonNuclear);
        assert_eq!(resolver.resolve_sequence("GRCh37", "M").unwrap(), mt);
    }

    #[test]
    fn test_alt_sequence_needs_accession() {
        let resolver = resolver();
        let alt = resolver.resolve_sequence("GRCh38", "NT_167244.2").unwrap();
        assert_eq!(alt.role, SequenceRole::AltScaffold);
        assert_eq!(alt.unit, AssemblyUnit::AltRefLoci(1));

        assert_eq!(resolver.resolve_sequence("GRCh38", "chr6_GL000250v2_alt").unwrap(), alt);
        assert_eq!(resolver.resolve_sequence("GRCh38", "HSCHR6_MHC_APD_CTG1").unwrap(), alt);

        let chr6 = resolver.resolve_sequence("GRCh38", "6").unwrap();
        assert_eq!(chr6.role, SequenceRole::AssembledMolecule);
    }

    #[test]
    fn test_unplaced_scaffold_chromosome() {
        let resolver = resolver();
        let un = resolver.resolve_sequence("GRCh38", "chrUn_KI270302v1").unwrap();
        assert_eq!(un.chromosome, "Un");
        assert_eq!(un.role, SequenceRole::UnplacedScaffold);
    }

    #[test]
    fn test_unknown_sequence() {
        let resolver = resolver();
        assert!(matches!(
            resolver.resolve_sequence("GRCh38", "chr99"),
            Err(ResolveError::UnknownSequence { .. })
        ));
        assert!(matches!(
            resolver.resolve_sequence("hg18", "1"),
            Err(ResolveError::UnknownAssembly(_))
        ));
    }

    #[test]
    fn test_coordinate_bounds() {
        let resolver = resolver();
        let seq = resolver.resolve_sequence("GRCh38", "MT").unwrap();

        assert!(resolver.validate_coordinate_within_sequence(seq, 1, seq.length).is_ok());
        assert!(resolver.validate_coordinate_within_sequence(seq, 0, seq.length).is_err());
        assert!(resolver.validate_coordinate_within_sequence(seq, 1, seq.length + 1).is_err());
        assert!(resolver.validate_coordinate_within_sequence(seq, 200, 100).is_err());
    }

    #[test]
    fn test_sequences_by_role() {
        let resolver = resolver();
        let patches = resolver.sequences_by_role("GRCh38.p14", SequenceRole::FixPatch).unwrap();
        assert!(!patches.is_empty());
        assert!(patches.iter().all(|s| s.unit == AssemblyUnit::Patches));

        let molecules = resolver
            .sequences_by_role("GRCh37", SequenceRole::AssembledMolecule)
            .unwrap();
        assert_eq!(molecules.len(), 25);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!(AssemblyUnit::parse("ALT_REF_LOCI_7"), Some(AssemblyUnit::AltRefLoci(7)));
        assert_eq!(AssemblyUnit::parse("Primary Assembly"), Some(AssemblyUnit::PrimaryAssembly));
        assert_eq!(AssemblyUnit::parse("ALT_REF_LOCI_x"), None);
        assert_eq!(AssemblyUnit::AltRefLoci(3).to_string(), "ALT_REF_LOCI_3");
    }
}
