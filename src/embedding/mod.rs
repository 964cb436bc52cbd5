//! Text embedding: provider interface plus the per-project cache.

pub mod cache;
pub mod provider;

use std::path::PathBuf;

pub use cache::EmbeddingCache;
pub use provider::{EmbeddingProvider, HashedEmbeddingProvider, HttpEmbeddingProvider};

/// Output dimension of every embedding provider.
pub const EMBEDDING_DIM: usize = 384;

/// Errors from the embedding subsystem. Provider failures are fatal for the
/// whole embed call; there is no partial-result fallback.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Embedding provider unavailable: {0}")]
    Provider(String),
    #[error("Embedding provider returned {got} vectors for {want} texts")]
    BatchSizeMismatch { want: usize, got: usize },
    #[error("Embedding length mismatch: expected {EMBEDDING_DIM}, got {0}")]
    DimensionMismatch(usize),
    #[error("Failed to read embeddings cache {path}: {source}")]
    CacheRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Corrupted embeddings cache {path}: {source}")]
    CacheDecode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write embeddings cache {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode embeddings cache: {0}")]
    CacheEncode(serde_json::Error),
    #[error("Invalid embedding endpoint {url}: {reason}")]
    Endpoint { url: String, reason: String },
}
