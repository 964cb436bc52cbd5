//! Embedding providers.
//!
//! The real text model lives outside this crate. `HttpEmbeddingProvider`
//! talks to a local inference endpoint; `HashedEmbeddingProvider` derives
//! deterministic pseudo-embeddings from content hashes so the tool and its
//! tests work offline. Both return unit-normalized vectors of
//! [`EMBEDDING_DIM`] values and are deterministic per text.

use std::time::Duration;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use super::{EMBEDDING_DIM, EmbeddingError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(120);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Batch text→vector capability.
pub trait EmbeddingProvider {
    /// Embed every text, preserving order. Any failure fails the whole
    /// batch.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Short human-readable description for diagnostics.
    fn describe(&self) -> String;
}

/// Provider backed by an HTTP inference endpoint.
///
/// Sends `{"texts": [...]}` and expects `{"embeddings": [[...], ...]}`.
pub struct HttpEmbeddingProvider {
    endpoint: Url,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: &str) -> Result<Self, EmbeddingError> {
        let endpoint = Url::parse(endpoint).map_err(|err| EmbeddingError::Endpoint {
            url: endpoint.to_string(),
            reason: err.to_string(),
        })?;
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build();
        Ok(Self { endpoint, agent })
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .agent
            .post(self.endpoint.as_str())
            .send_json(serde_json::json!({ "texts": texts }))
            .map_err(|err| EmbeddingError::Provider(err.to_string()))?;
        let decoded: EmbedResponse = response
            .into_json()
            .map_err(|err| EmbeddingError::Provider(err.to_string()))?;
        if decoded.embeddings.len() != texts.len() {
            return Err(EmbeddingError::BatchSizeMismatch {
                want: texts.len(),
                got: decoded.embeddings.len(),
            });
        }
        for vector in &decoded.embeddings {
            if vector.len() != EMBEDDING_DIM {
                return Err(EmbeddingError::DimensionMismatch(vector.len()));
            }
        }
        Ok(decoded.embeddings)
    }

    fn describe(&self) -> String {
        format!("http endpoint {}", self.endpoint)
    }
}

/// Deterministic offline provider derived from content hashes.
///
/// Vectors carry no semantic signal; equal texts map to equal vectors and
/// different texts almost surely differ. Good enough for plumbing, caching,
/// and retrieval-by-identity; classify tasks want a real endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashedEmbeddingProvider;

impl EmbeddingProvider for HashedEmbeddingProvider {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| hashed_embedding(text)).collect())
    }

    fn describe(&self) -> String {
        "deterministic hashed vectors (offline)".to_string()
    }
}

/// Unit-normalized pseudo-embedding derived from a sha256 digest, bytes
/// mapped cyclically into [-1, 1].
pub fn hashed_embedding(text: &str) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut vector: Vec<f32> = (0..EMBEDDING_DIM)
        .map(|i| (digest[i % digest.len()] as f32 / 255.0) * 2.0 - 1.0)
        .collect();
    normalize(&mut vector);
    vector
}

/// Pseudo-embedding whose direction is dominated by `cluster`, with a small
/// text-specific perturbation. Texts sharing a cluster land close together,
/// mimicking what a semantic model does for related inputs. Used by tests
/// and diagnostics that need separable data.
pub fn clustered_embedding(text: &str, cluster: &str) -> Vec<f32> {
    let base = Sha256::digest(cluster.as_bytes());
    let noise = Sha256::digest(text.as_bytes());
    let mut vector: Vec<f32> = (0..EMBEDDING_DIM)
        .map(|i| {
            let centroid = (base[i % base.len()] as f32 / 255.0) * 2.0 - 1.0;
            let jitter = (noise[i % noise.len()] as f32 / 255.0) * 2.0 - 1.0;
            centroid + jitter * 0.1
        })
        .collect();
    normalize(&mut vector);
    vector
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
