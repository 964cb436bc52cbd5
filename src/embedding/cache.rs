//! Content-hash embedding cache.
//!
//! Memoizes text→vector lookups in one JSON file per project. Only the
//! cache-miss subset is sent to the provider, in its original order, and
//! all new entries are persisted in a single batch write after the call
//! completes; a crash mid-call loses at most the uncached portion. Entries
//! are never invalidated and the cache grows without bound, which is
//! acceptable at this scale. The load-fill-save cycle assumes a single
//! local writer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::{EmbeddingError, provider::EmbeddingProvider};

/// Persistent hash→vector store at a fixed path.
pub struct EmbeddingCache {
    path: PathBuf,
}

impl EmbeddingCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Embed every text, serving hits from the cache and batching misses to
    /// `provider`. Results are returned in input order.
    pub fn embed_texts(
        &self,
        provider: &dyn EmbeddingProvider,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut cache = self.load()?;
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match cache.get(&content_hash(text)) {
                Some(vector) => results[i] = Some(vector.clone()),
                None => {
                    miss_indices.push(i);
                    miss_texts.push(text.clone());
                }
            }
        }

        if !miss_texts.is_empty() {
            let fresh = provider.embed_batch(&miss_texts)?;
            if fresh.len() != miss_texts.len() {
                return Err(EmbeddingError::BatchSizeMismatch {
                    want: miss_texts.len(),
                    got: fresh.len(),
                });
            }
            for ((&i, text), vector) in miss_indices.iter().zip(&miss_texts).zip(fresh) {
                cache.insert(content_hash(text), vector.clone());
                results[i] = Some(vector);
            }
            self.save(&cache)?;
        }

        Ok(results
            .into_iter()
            .map(|slot| slot.expect("every slot filled"))
            .collect())
    }

    /// Embed a single text through the same cache path.
    pub fn embed_text(
        &self,
        provider: &dyn EmbeddingProvider,
        text: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let texts = [text.to_string()];
        let mut results = self.embed_texts(provider, &texts)?;
        Ok(results.remove(0))
    }

    /// Number of cached entries, for diagnostics.
    pub fn len(&self) -> Result<usize, EmbeddingError> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, EmbeddingError> {
        Ok(self.len()? == 0)
    }

    fn load(&self) -> Result<BTreeMap<String, Vec<f32>>, EmbeddingError> {
        if !self.path.is_file() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read(&self.path).map_err(|source| EmbeddingError::CacheRead {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| EmbeddingError::CacheDecode {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, cache: &BTreeMap<String, Vec<f32>>) -> Result<(), EmbeddingError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| EmbeddingError::CacheWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let data = serde_json::to_vec(cache).map_err(EmbeddingError::CacheEncode)?;
        std::fs::write(&self.path, data).map_err(|source| EmbeddingError::CacheWrite {
            path: self.path.clone(),
            source,
        })
    }
}

/// Stable 16-hex-char content hash keying cache entries.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
