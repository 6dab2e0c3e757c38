#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use chunker::{Chunker, ChunkingConfig};
pub use error::{Error, Result};
pub use loader::DocumentLoader;
pub use traits::Embedder;
pub use types::{Chunk, ChunkMeta, Document, Record, SearchResult};
