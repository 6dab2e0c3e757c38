//! Sentence-aware chunking with word overlap.
//!
//! Text is split on `.`, `!` and `?` into sentence units which are packed into
//! a buffer until the next unit would push it past `max_size` characters. A
//! closed buffer becomes a chunk; the next buffer is seeded with the trailing
//! `overlap` words of the one just closed. `max_size` is measured in
//! characters while `overlap` is measured in words.
//!
//! `max_size` is a target, not a cap: a single sentence longer than
//! `max_size` is emitted whole.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Chunk, ChunkMeta, Document};

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];
const KEPT_PUNCTUATION: &str = ".,!?;:()-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk length in characters.
    pub max_size: usize,
    /// Number of trailing words carried into the next chunk.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_size: 300, overlap: 50 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    pub fn chunk(&self, text: &str, meta: &ChunkMeta) -> Vec<Chunk> {
        chunk_text(text, meta, self.config.max_size, self.config.overlap)
    }

    /// Chunks every document in order. Chunk ids restart at 0 for each document.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut all_chunks = Vec::new();
        for doc in documents {
            let chunks = self.chunk(&doc.content, &doc.meta());
            debug!(source = %doc.source, chunks = chunks.len(), "chunked document");
            all_chunks.extend(chunks);
        }
        all_chunks
    }
}

/// Splits `text` into ordered chunks. Never fails; empty input yields no chunks.
pub fn chunk_text(text: &str, meta: &ChunkMeta, max_size: usize, overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut closed_any = false;

    for sentence in split_sentences(text) {
        let buffer_len = buffer.chars().count();
        let sentence_len = sentence.chars().count();

        if buffer_len + sentence_len + 1 > max_size {
            if !buffer.is_empty() {
                push_chunk(&mut chunks, &buffer, meta);
                closed_any = true;
            }
            buffer = if closed_any && overlap > 0 {
                let mut seeded = trailing_words(&buffer, overlap);
                seeded.push(' ');
                seeded.push_str(sentence);
                seeded
            } else {
                sentence.to_string()
            };
        } else {
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(sentence);
        }
    }

    if !buffer.is_empty() {
        push_chunk(&mut chunks, &buffer, meta);
    }
    chunks
}

/// Sentence-like units: split on terminators, trimmed, empties dropped.
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(&SENTENCE_TERMINATORS[..]).map(str::trim).filter(|s| !s.is_empty())
}

/// Collapses whitespace runs, strips characters outside the kept set, then trims.
pub fn normalize_chunk_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped: String = collapsed
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(*c))
        .collect();
    stripped.trim().to_string()
}

fn trailing_words(text: &str, count: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(count);
    words[start..].join(" ")
}

fn push_chunk(chunks: &mut Vec<Chunk>, buffer: &str, meta: &ChunkMeta) {
    let content = normalize_chunk_text(buffer);
    // nothing left to embed
    if content.is_empty() {
        return;
    }
    let chunk_id = chunks.len();
    chunks.push(Chunk { content, source: meta.source.clone(), title: meta.title.clone(), chunk_id });
}
