//! Raw reference tables and their on-disk / embedded sources.
//!
//! Tables are read verbatim here and turned into typed rows; all indexing
//! and invariant checking happens in the `bio` catalogs.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::error::LoadError;

pub(crate) const VOCABULARIES: &str = "vocabularies.json";
pub(crate) const VARIANT_TYPES: &str = "variant_types.json";
pub(crate) const ASSEMBLIES: &str = "assemblies.json";
pub(crate) const SEQUENCES: &str = "sequences.tsv";
pub(crate) const SAMPLES: &str = "samples.tsv";

/// Table files in fingerprint order.
const TABLE_FILES: [&str; 5] = [VOCABULARIES, VARIANT_TYPES, ASSEMBLIES, SEQUENCES, SAMPLES];

/// Where reference tables are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReferenceSource {
    /// Tables compiled into the crate.
    #[default]
    Embedded,
    /// A directory holding the five table files.
    Directory(PathBuf),
}

impl ReferenceSource {
    /// Source reading tables from a directory.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        ReferenceSource::Directory(path.into())
    }

    /// Read every table of this source into memory.
    pub(crate) fn read(&self) -> Result<TableSet, LoadError> {
        match self {
            ReferenceSource::Embedded => Ok(TableSet {
                vocabularies: Cow::Borrowed(include_str!("../data/vocabularies.json")),
                variant_types: Cow::Borrowed(include_str!("../data/variant_types.json")),
                assemblies: Cow::Borrowed(include_str!("../data/assemblies.json")),
                sequences: Cow::Borrowed(include_str!("../data/sequences.tsv")),
                samples: Cow::Borrowed(include_str!("../data/samples.tsv")),
            }),
            ReferenceSource::Directory(dir) => Ok(TableSet {
                vocabularies: Cow::Owned(read_table(dir, VOCABULARIES)?),
                variant_types: Cow::Owned(read_table(dir, VARIANT_TYPES)?),
                assemblies: Cow::Owned(read_table(dir, ASSEMBLIES)?),
                sequences: Cow::Owned(read_table(dir, SEQUENCES)?),
                samples: Cow::Owned(read_table(dir, SAMPLES)?),
            }),
        }
    }
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceSource::Embedded => f.write_str("embedded"),
            ReferenceSource::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

fn read_table(dir: &Path, name: &str) -> Result<String, LoadError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(LoadError::MissingTable(path.display().to_string()));
    }
    fs::read_to_string(&path).map_err(|e| LoadError::Io { path, source: e })
}

/// Raw text of all reference tables.
pub(crate) struct TableSet {
    pub vocabularies: Cow<'static, str>,
    pub variant_types: Cow<'static, str>,
    pub assemblies: Cow<'static, str>,
    pub sequences: Cow<'static, str>,
    pub samples: Cow<'static, str>,
}

impl TableSet {
    /// SHA-256 over all tables, identifying the reference data release.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let contents = [
            &self.vocabularies,
            &self.variant_types,
            &self.assemblies,
            &self.sequences,
            &self.samples,
        ];
        for (name, content) in TABLE_FILES.iter().zip(contents) {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(content.as_bytes());
        }
        format!("sha256:{:x}", hasher.finalize())
    }

    pub fn vocabulary_table(&self) -> Result<VocabularyTable, LoadError> {
        parse_json(VOCABULARIES, &self.vocabularies)
    }

    pub fn variant_type_table(&self) -> Result<VariantTypeTable, LoadError> {
        parse_json(VARIANT_TYPES, &self.variant_types)
    }

    pub fn assembly_table(&self) -> Result<AssemblyTable, LoadError> {
        parse_json(ASSEMBLIES, &self.assemblies)
    }

    pub fn sequence_rows(&self) -> Result<Vec<SequenceRow>, LoadError> {
        parse_tsv(SEQUENCES, &self.sequences)
    }

    pub fn sample_rows(&self) -> Result<Vec<SampleRow>, LoadError> {
        parse_tsv(SAMPLES, &self.samples)
    }
}

fn parse_json<T: DeserializeOwned>(table: &'static str, text: &str) -> Result<T, LoadError> {
    serde_json::from_str(text).map_err(|e| LoadError::Json { table, source: e })
}

/// Parse a tab-separated table with a header row; `#` lines are comments.
fn parse_tsv<T: DeserializeOwned>(table: &'static str, text: &str) -> Result<Vec<T>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T = result.map_err(|e| LoadError::Csv { table, source: e })?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(LoadError::Invariant {
            table,
            message: "table has no rows".to_string(),
        });
    }
    Ok(rows)
}

/// Treat the assembly-report placeholder `na` like an empty cell.
pub(crate) fn defined(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("na"))
}

#[derive(Debug, Deserialize)]
pub(crate) struct VocabularyTable {
    pub vocabularies: Vec<VocabularyRow>,
    #[serde(default)]
    pub required_fields: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub ignorable_fields: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VocabularyRow {
    pub record_type: String,
    pub field: String,
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariantTypeTable {
    pub call_types: Vec<VariantTypeRow>,
    pub region_types: Vec<VariantTypeRow>,
    #[serde(default)]
    pub linkage: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub default_region: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariantTypeRow {
    pub label: String,
    pub normalized: String,
    pub so_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssemblyTable {
    pub assemblies: Vec<AssemblyRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssemblyRow {
    pub refseq_accession: String,
    pub insdc_accession: String,
    pub grch_version: String,
    #[serde(default)]
    pub grch_short_name: Option<String>,
    #[serde(default)]
    pub ucsc_name: Option<String>,
}

/// One row of an NCBI assembly report, prefixed with its assembly accession.
#[derive(Debug, Deserialize)]
pub(crate) struct SequenceRow {
    #[serde(rename = "Assembly-Accession")]
    pub assembly_accession: String,
    #[serde(rename = "Sequence-Name")]
    pub sequence_name: String,
    #[serde(rename = "Sequence-Role")]
    pub role: String,
    #[serde(rename = "Assigned-Molecule")]
    pub assigned_molecule: Option<String>,
    #[serde(rename = "GenBank-Accn")]
    pub genbank_accession: String,
    #[serde(rename = "RefSeq-Accn")]
    pub refseq_accession: String,
    #[serde(rename = "Assembly-Unit")]
    pub assembly_unit: String,
    #[serde(rename = "Sequence-Length")]
    pub length: u64,
    #[serde(rename = "UCSC-style-name")]
    pub ucsc_name: Option<String>,
    #[serde(rename = "GC-Percent", default)]
    pub gc_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SampleRow {
    #[serde(rename = "Sample-ID")]
    pub sample_id: String,
    #[serde(rename = "BioSample-Accession")]
    pub biosample_accession: Option<String>,
    #[serde(rename = "Sex")]
    pub sex: Option<String>,
    #[serde(rename = "Population")]
    pub population: Option<String>,
}
