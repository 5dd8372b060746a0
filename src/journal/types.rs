//! Core journal type definitions.
//!
//! [`Document`] is one parsed markdown file, [`Chunk`] is the stored unit
//! (an embedded window or a companion full entry), and [`EntryMetadata`] is
//! the schema applied to frontmatter before it reaches the index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Whether a stored chunk holds a whole entry or a window of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// The entire body of an entry.
    FullEntry,
    /// One overlapping window of an entry that needed several chunks.
    PartialEntry,
}

impl ChunkType {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullEntry => "full_entry",
            Self::PartialEntry => "partial_entry",
        }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChunkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_entry" => Ok(Self::FullEntry),
            "partial_entry" => Ok(Self::PartialEntry),
            _ => Err(format!("unknown chunk type: {s}")),
        }
    }
}

/// A scalar frontmatter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetaValue {
    /// Numeric view of the value, if it has one. Text is not parsed here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Frontmatter of one entry: the two well-known date fields plus an open map
/// of scalar values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, MetaValue>,
}

impl EntryMetadata {
    /// `date`, falling back to `created`.
    pub fn resolved_date(&self) -> Option<&str> {
        self.date.as_deref().or(self.created.as_deref())
    }

    /// Look up any field by name, including `date` and `created`.
    pub fn value(&self, key: &str) -> Option<MetaValue> {
        match key {
            "date" => self.date.clone().map(MetaValue::Text),
            "created" => self.created.clone().map(MetaValue::Text),
            _ => self.extra.get(key).cloned(),
        }
    }
}

/// One journal file, read fresh from disk for a single indexing run.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the journal root, `/`-separated. Stable identity key.
    pub source: String,
    pub metadata: EntryMetadata,
    pub body: String,
}

/// A stored unit of text: an embedded window of an entry, or the companion
/// full entry kept for expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{source}_{chunk_index}` for windows, `{source}_full` for companions.
    pub id: String,
    pub source: String,
    /// Position of the window within its entry. `None` for companion records.
    pub chunk_index: Option<usize>,
    pub chunk_type: ChunkType,
    pub text: String,
    pub metadata: EntryMetadata,
}

/// A chunk on its way into the store.
#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub chunk: Chunk,
    /// Present for similarity candidates; absent for companion full entries.
    pub embedding: Option<Vec<f32>>,
}

impl IndexRecord {
    pub fn embedded(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            chunk,
            embedding: Some(embedding),
        }
    }

    pub fn text_only(chunk: Chunk) -> Self {
        Self {
            chunk,
            embedding: None,
        }
    }
}

/// A store-ranked chunk returned by a similarity query.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chunk: Chunk,
    pub distance: f64,
}

/// Selects stored records by source and/or chunk type. Empty filter matches all.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub source: Option<String>,
    pub chunk_type: Option<ChunkType>,
}

impl RecordFilter {
    /// The full-entry record for one source.
    pub fn full_entry(source: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            chunk_type: Some(ChunkType::FullEntry),
        }
    }
}
