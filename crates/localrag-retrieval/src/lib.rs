use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use localrag_core::config::{expand_path, Settings};
use localrag_core::error::{Error, Result};
use localrag_core::types::{Chunk, Document, SearchResult};
use localrag_core::{Chunker, ChunkingConfig, DocumentLoader, Embedder};
use localrag_vector::VectorIndex;

/// Chunker + embedder + vector index behind two operations: index documents,
/// retrieve for a query.
///
/// The service is the single owner of its index. Indexing takes `&mut self`
/// and retrieval `&self`, so sharing one across threads means wrapping it in
/// an `RwLock` (one writer, many readers).
pub struct RetrievalService<E: Embedder> {
    chunker: Chunker,
    embedder: E,
    loader: DocumentLoader,
    index: VectorIndex<Chunk>,
    index_path: PathBuf,
    top_k: usize,
    indexed: bool,
}

impl<E: Embedder> RetrievalService<E> {
    pub fn new(embedder: E, chunking: ChunkingConfig, index_path: impl Into<PathBuf>) -> Result<Self> {
        let index = VectorIndex::new(embedder.dim())?;
        Ok(Self {
            chunker: Chunker::new(chunking),
            embedder,
            loader: DocumentLoader::default(),
            index,
            index_path: index_path.into(),
            top_k: 5,
            indexed: false,
        })
    }

    pub fn from_settings(embedder: E, settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let mut service = Self::new(embedder, settings.chunking, expand_path(&settings.index.path))?;
        service.loader = DocumentLoader::new(&settings.data.extensions);
        service.top_k = settings.retrieval.top_k;
        Ok(service)
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Number of chunks currently held by the index.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &VectorIndex<Chunk> {
        &self.index
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Chunks, embeds, adds and persists `documents`; returns the number of
    /// chunks indexed.
    ///
    /// All or nothing: if embedding, insertion or saving fails the in-memory
    /// index is left as it was.
    pub fn index_documents(&mut self, documents: &[Document]) -> Result<usize> {
        let chunks = self.chunker.chunk_documents(documents);
        info!(documents = documents.len(), chunks = chunks.len(), "chunked documents");

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&texts).map_err(Error::Embedding)?
        };

        let count = chunks.len();
        let mut staged = self.index.clone();
        staged.add(&embeddings, chunks)?;
        staged.save(&self.index_path)?;

        self.index = staged;
        self.indexed = true;
        info!(chunks = count, total = self.index.len(), path = %self.index_path.display(), "indexed documents");
        Ok(count)
    }

    /// Loads every supported file under `dir` and indexes it.
    pub fn index_directory(&mut self, dir: &Path) -> Result<usize> {
        let documents = self.loader.load_directory(dir)?;
        if documents.is_empty() {
            warn!(dir = %dir.display(), "no supported documents found");
        }
        self.index_documents(&documents)
    }

    /// Restores the index saved at the configured path; returns its size.
    ///
    /// The saved index must have been built with an embedder of the same
    /// dimensionality.
    pub fn load(&mut self) -> Result<usize> {
        let loaded: VectorIndex<Chunk> = VectorIndex::open(&self.index_path)?;
        if loaded.dim() != self.embedder.dim() {
            return Err(Error::DimensionMismatch { expected: self.embedder.dim(), actual: loaded.dim() });
        }
        self.index = loaded;
        self.indexed = true;
        Ok(self.index.len())
    }

    /// The `k` chunks most similar to `query`, best first.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult<Chunk>>> {
        if !self.indexed {
            return Err(Error::NotIndexed);
        }
        let query_vec = self.embedder.embed_one(query).map_err(Error::Embedding)?;
        self.index.search(&query_vec, k)
    }

    pub fn retrieve_default(&self, query: &str) -> Result<Vec<SearchResult<Chunk>>> {
        self.retrieve(query, self.top_k)
    }

    /// Like [`retrieve`](Self::retrieve), folded into a serializable outcome.
    pub fn query(&self, query: &str, k: usize) -> RetrievalOutcome {
        RetrievalOutcome::from_result(query, self.retrieve(query, k))
    }
}

/// Retrieval result for callers that branch on data rather than on `Err`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    Ok { query: String, results: Vec<SearchResult<Chunk>> },
    Error { query: String, kind: String, message: String },
}

impl RetrievalOutcome {
    pub fn from_result(query: &str, result: Result<Vec<SearchResult<Chunk>>>) -> Self {
        match result {
            Ok(results) => RetrievalOutcome::Ok { query: query.to_string(), results },
            Err(e) => RetrievalOutcome::Error { query: query.to_string(), kind: e.kind().to_string(), message: e.to_string() },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RetrievalOutcome::Ok { .. })
    }
}
