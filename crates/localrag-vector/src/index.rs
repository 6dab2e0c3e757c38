use std::cmp::Ordering;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use localrag_core::error::{Error, Result};
use localrag_core::types::{Record, SearchResult};

use crate::persist;

/// Exhaustive cosine-similarity index.
///
/// Vectors are L2-normalised on insert and stored contiguously; an entry's
/// position (insertion order, from 0) is its key. Entries are never removed or
/// reordered. Metadata is opaque: search only clones it and attaches a score
/// and rank.
///
/// Not synchronised. A shared index needs a single writer; concurrent readers
/// are fine while no `add` or `load` is in flight (e.g. behind an `RwLock`).
#[derive(Debug, Clone)]
pub struct VectorIndex<M = Record> {
    dim: usize,
    vectors: Vec<f32>,
    metadata: Vec<M>,
}

impl<M> VectorIndex<M> {
    pub fn new(embedding_dim: usize) -> Result<Self> {
        if embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be positive".to_string()));
        }
        if u32::try_from(embedding_dim).is_err() {
            return Err(Error::InvalidConfig(format!("embedding_dim {embedding_dim} exceeds u32::MAX")));
        }
        Ok(Self { dim: embedding_dim, vectors: Vec::new(), metadata: Vec::new() })
    }

    pub(crate) fn from_parts(dim: usize, vectors: Vec<f32>, metadata: Vec<M>) -> Self {
        Self { dim, vectors, metadata }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn metadata(&self, position: usize) -> Option<&M> {
        self.metadata.get(position)
    }

    /// Stored (normalised) vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.vectors.chunks_exact(self.dim).nth(position)
    }

    pub(crate) fn raw_vectors(&self) -> &[f32] {
        &self.vectors
    }

    pub(crate) fn records(&self) -> &[M] {
        &self.metadata
    }

    /// Appends `vectors` with their `metadata`, in order.
    ///
    /// Every vector is validated before anything is stored, so a failing call
    /// leaves the index untouched.
    pub fn add<V>(&mut self, vectors: &[V], metadata: Vec<M>) -> Result<()>
    where
        V: AsRef<[f32]>,
    {
        if vectors.len() != metadata.len() {
            return Err(Error::LengthMismatch { vectors: vectors.len(), metadata: metadata.len() });
        }
        let mut staged = Vec::with_capacity(vectors.len() * self.dim);
        for (position, v) in vectors.iter().enumerate() {
            let v = v.as_ref();
            self.check_dim(v.len())?;
            let unit = normalized(v).ok_or(Error::DegenerateVector { position })?;
            staged.extend(unit);
        }
        self.vectors.extend(staged);
        self.metadata.extend(metadata);
        debug!(added = vectors.len(), total = self.len(), "vectors added");
        Ok(())
    }

    fn check_dim(&self, actual: usize) -> Result<()> {
        if actual != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual });
        }
        Ok(())
    }
}

impl<M: Clone> VectorIndex<M> {
    /// Top `k` entries by cosine similarity to `query`, best first.
    ///
    /// Equal scores rank the earlier-inserted entry first. Returns
    /// `min(k, len)` results; `k == 0` returns none.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult<M>>> {
        self.check_dim(query.len())?;
        let query = normalized(query).ok_or(Error::DegenerateVector { position: 0 })?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> =
            self.vectors.chunks_exact(self.dim).map(|v| dot(&query, v)).enumerate().collect();
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_score_then_position);
            scored.truncate(k);
        }
        scored.sort_by(by_score_then_position);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (position, score))| SearchResult {
                metadata: self.metadata[position].clone(),
                similarity_score: score,
                rank: i + 1,
            })
            .collect())
    }
}

impl<M: Serialize> VectorIndex<M> {
    /// Persists the index at `path` (a prefix; see [`persist`]). Parent
    /// directories are created as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        persist::save(self, path)?;
        info!(path = %path.display(), entries = self.len(), dim = self.dim, "index saved");
        Ok(())
    }
}

impl<M: DeserializeOwned> VectorIndex<M> {
    /// Reads an index previously written by [`VectorIndex::save`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let index = persist::load(path)?;
        info!(path = %path.display(), entries = index.len(), dim = index.dim, "index loaded");
        Ok(index)
    }

    /// Replaces this index, dimensionality included, with the one saved at
    /// `path`. On error the current state is kept.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::open(path)?;
        Ok(())
    }
}

fn by_score_then_position(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Unit vector in the direction of `v`, or `None` for zero vectors and
/// vectors with non-finite components. The norm is taken in `f64` so very
/// large or very small components neither overflow nor underflow.
fn normalized(v: &[f32]) -> Option<Vec<f32>> {
    if v.iter().any(|x| !x.is_finite()) {
        return None;
    }
    let norm = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    if norm == 0.0 {
        return None;
    }
    Some(v.iter().map(|&x| (f64::from(x) / norm) as f32).collect())
}
