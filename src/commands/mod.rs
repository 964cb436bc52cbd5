//! CLI command implementations, one module per subcommand.

pub mod add;
pub mod doctor;
pub mod export;
pub mod init;
pub mod predict;
pub mod retrain;
pub mod review;
pub mod stats;
pub mod train;

use thiserror::Error;

use crate::embedding::{EmbeddingError, EmbeddingProvider, HashedEmbeddingProvider, HttpEmbeddingProvider};
use crate::project::{ProjectConfig, ProjectError};
use crate::retrieval::RetrievalError;
use crate::store::model::ModelStoreError;
use crate::store::review::ReviewStoreError;
use crate::store::samples::SampleStoreError;
use crate::train::TrainError;

/// Command-level error: any fatal condition exits the process with code 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("Failed to read input file {path}: {source}")]
    ReadInput {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to access {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Samples(#[from] SampleStoreError),
    #[error(transparent)]
    Review(#[from] ReviewStoreError),
    #[error(transparent)]
    Model(#[from] ModelStoreError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Resolve the embedding provider for a project: the configured HTTP
/// endpoint when present, the deterministic offline provider otherwise.
pub(crate) fn provider_for(
    config: &ProjectConfig,
) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
    match &config.embedding_endpoint {
        Some(endpoint) => Ok(Box::new(HttpEmbeddingProvider::new(endpoint)?)),
        None => Ok(Box::new(HashedEmbeddingProvider)),
    }
}

/// Print aligned key/value rows.
pub(crate) fn print_table(rows: &[(&str, String)]) {
    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in rows {
        println!("  {key:<width$}  {value}");
    }
}

pub(crate) fn percent(value: f32) -> String {
    format!("{:.1}%", value * 100.0)
}
