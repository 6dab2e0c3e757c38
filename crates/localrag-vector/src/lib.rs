//! localrag-vector
//!
//! Exact cosine-similarity index over L2-normalised vectors with opaque
//! per-entry metadata, persisted in a versioned two-file format. See `index`
//! for the in-memory structure and `persist` for the on-disk layout.

pub mod index;
pub mod persist;

pub use index::VectorIndex;
pub use persist::{metadata_path, vectors_path, FORMAT_VERSION};
