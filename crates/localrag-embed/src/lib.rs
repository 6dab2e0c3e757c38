//! Embedding oracles for localrag.
//!
//! [`HashEmbedder`] is a deterministic stand-in used by tests and offline
//! runs; [`SentenceEmbedder`] runs a local BERT-family sentence model.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use localrag_core::config::{expand_path, EmbeddingSettings};
use localrag_core::Embedder;

pub mod hash;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use hash::HashEmbedder;
pub use model::SentenceEmbedder;
pub use pool::masked_mean_l2;

const DEFAULT_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";

/// Picks the embedder described by `settings`.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the hashing embedder regardless of settings.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if settings.use_fake || env_fake {
        info!(dim = settings.dim, "using HashEmbedder");
        return Ok(Box::new(HashEmbedder::new(settings.dim)));
    }
    let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Box::new(SentenceEmbedder::from_dir(&model_dir, settings.max_len)?))
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = expand_path(&dir); if p.exists() { info!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); } }
    if let Some(dir) = configured { let p = expand_path(dir); if p.exists() { info!(dir = %p.display(), "using embedding.model_dir"); return Ok(p); } }
    let default = Path::new(DEFAULT_MODEL_DIR); if default.exists() { info!(dir = %default.display(), "using default model dir"); return Ok(default.to_path_buf()); }
    Err(anyhow!("Could not locate a sentence embedding model directory (set embedding.model_dir or APP_MODEL_DIR)"))
}
