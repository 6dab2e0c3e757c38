//! Domain types shared by the chunker, the vector index and the retrieval service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque key-ordered metadata record.
pub type Record = BTreeMap<String, serde_json::Value>;

/// A raw document handed to the core by whatever acquired it.
///
/// - `content`: full text of the document
/// - `source`: stable identifier, usually the file path
/// - `title`: human readable label, usually the file stem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub source: String,
    pub title: String,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>, title: impl Into<String>) -> Self {
        Self { content: content.into(), source: source.into(), title: title.into() }
    }

    pub fn meta(&self) -> ChunkMeta {
        ChunkMeta { source: self.source.clone(), title: self.title.clone() }
    }
}

/// Per-document fields copied onto every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub source: String,
    pub title: String,
}

/// A bounded slice of one document, the unit of retrieval.
///
/// `chunk_id` is the 0-based emission index within its own document and is
/// not unique across documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    pub title: String,
    pub chunk_id: usize,
}

/// A stored metadata record returned by a search, augmented with its score and rank.
///
/// The record's own fields are flattened so the serialized form reads as the
/// original record plus `similarity_score` and `rank`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult<M = Record> {
    #[serde(flatten)]
    pub metadata: M,
    pub similarity_score: f32,
    /// 1-based position in the result list.
    pub rank: usize,
}
