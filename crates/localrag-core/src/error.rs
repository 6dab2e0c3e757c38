use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Degenerate vector at position {position}: norm is zero or not finite")]
    DegenerateVector { position: usize },

    #[error("Length mismatch: {vectors} vectors but {metadata} metadata records")]
    LengthMismatch { vectors: usize, metadata: usize },

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Nothing indexed yet: index documents or load a saved index first")]
    NotIndexed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable snake_case name of the variant, for structured error output.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DimensionMismatch { .. } => "dimension_mismatch",
            Error::DegenerateVector { .. } => "degenerate_vector",
            Error::LengthMismatch { .. } => "length_mismatch",
            Error::NotFound(_) => "not_found",
            Error::SchemaMismatch(_) => "schema_mismatch",
            Error::NotIndexed => "not_indexed",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Embedding(_) => "embedding",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
