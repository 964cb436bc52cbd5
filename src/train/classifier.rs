//! Classifier training orchestration and prediction.
//!
//! Drives the multi-epoch fitting loop over the network capability with
//! early stopping and best-checkpoint restoration, persists the result
//! atomically, and serves predictions through an explicit caller-owned
//! model cache.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use thiserror::Error;

use super::network::{self, AdamOptimizer, MlpNetwork};
use super::split::{self, stratified_split};
use crate::store::model::{
    ClassifierMetadata, MODEL_FILE, ModelMetadata, ModelStoreError, load_metadata, read_json,
    write_json_atomic,
};
use crate::store::now_rfc3339;

/// Upper bound on fitting epochs.
pub const MAX_EPOCHS: usize = 100;
/// Consecutive non-improving epochs tolerated before stopping early.
pub const PATIENCE: usize = 10;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Not enough training samples: have {have}, need at least {need}")]
    InsufficientSamples { have: usize, need: usize },
    #[error("Classifier training needs at least 2 categories, found {0}")]
    TooFewCategories(usize),
    #[error("Embedding length mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("Mismatched embeddings ({embeddings}) and labels ({labels})")]
    InputLengthMismatch { embeddings: usize, labels: usize },
    #[error(transparent)]
    Store(#[from] ModelStoreError),
}

/// Metrics reported after a completed training run.
#[derive(Debug, Clone)]
pub struct TrainResult {
    /// Training accuracy at the restored checkpoint.
    pub accuracy: f32,
    /// Validation accuracy at the restored checkpoint.
    pub val_accuracy: f32,
    /// Epochs actually executed (not the best epoch).
    pub epochs: usize,
    pub num_samples: usize,
    pub categories: Vec<String>,
}

/// Fit a classifier over the embeddings and persist it to `model_dir`.
///
/// The caller's model cache is invalidated after the write so the next
/// prediction loads the fresh model.
pub fn train_classifier(
    embeddings: &[Vec<f32>],
    labels: &[String],
    model_dir: &Path,
    cache: &mut ModelCache,
) -> Result<TrainResult, TrainError> {
    if embeddings.len() != labels.len() {
        return Err(TrainError::InputLengthMismatch {
            embeddings: embeddings.len(),
            labels: labels.len(),
        });
    }
    let categories = sorted_categories(labels);
    if categories.len() < 2 {
        return Err(TrainError::TooFewCategories(categories.len()));
    }
    let input_len = embeddings.first().map(|e| e.len()).unwrap_or(0);
    for embedding in embeddings {
        if embedding.len() != input_len {
            return Err(TrainError::DimensionMismatch {
                expected: input_len,
                got: embedding.len(),
            });
        }
    }

    let targets: Vec<usize> = labels
        .iter()
        .map(|label| {
            categories
                .binary_search(label)
                .expect("every label is in the sorted category list")
        })
        .collect();

    let split = stratified_split(labels);
    let gather = |indices: &[usize]| -> (Vec<Vec<f32>>, Vec<usize>) {
        let x = indices.iter().map(|&i| embeddings[i].clone()).collect();
        let y = indices.iter().map(|&i| targets[i]).collect();
        (x, y)
    };
    let (train_x, train_y) = gather(&split.train);
    let (val_x, val_y) = gather(&split.validation);
    if val_x.is_empty() {
        tracing::warn!(
            "No validation examples after the stratified split; early stopping will track training loss."
        );
    }

    tracing::info!(
        "Training classifier with {} samples, validating on {}...",
        train_x.len(),
        val_x.len()
    );

    let mut rng = StdRng::seed_from_u64(split::split_seed(labels));
    let mut net = MlpNetwork::new(input_len, categories.len(), &mut rng);
    let mut optimizer = AdamOptimizer::new(&net);

    let mut best_val_loss = f32::INFINITY;
    let mut best_epoch = 0usize;
    let mut best_snapshot = None;
    let mut best_accuracy = 0.0f32;
    let mut best_val_accuracy = 0.0f32;
    let mut patience_counter = 0usize;

    let mut final_accuracy = 0.0f32;
    let mut final_val_accuracy = 0.0f32;
    let mut epochs_run = 0usize;

    for epoch in 0..MAX_EPOCHS {
        let train_stats = network::fit_epoch(&mut net, &mut optimizer, &train_x, &train_y, &mut rng);
        let val_stats = if val_x.is_empty() {
            network::evaluate(&net, &train_x, &train_y)
        } else {
            network::evaluate(&net, &val_x, &val_y)
        };

        final_accuracy = train_stats.accuracy;
        final_val_accuracy = val_stats.accuracy;
        epochs_run = epoch + 1;

        if val_stats.loss < best_val_loss {
            best_val_loss = val_stats.loss;
            best_epoch = epoch;
            best_accuracy = train_stats.accuracy;
            best_val_accuracy = val_stats.accuracy;
            best_snapshot = Some(net.snapshot());
            patience_counter = 0;
        } else {
            patience_counter += 1;
            if patience_counter >= PATIENCE {
                tracing::info!(
                    "Early stopping at epoch {} (best at epoch {})",
                    epoch + 1,
                    best_epoch + 1
                );
                break;
            }
        }
    }

    // The final epoch may be overfit; report and save the best checkpoint.
    if let Some(snapshot) = &best_snapshot {
        if epochs_run > best_epoch + 1 {
            net.restore(snapshot);
            final_accuracy = best_accuracy;
            final_val_accuracy = best_val_accuracy;
        }
    }

    write_json_atomic(&model_dir.join(MODEL_FILE), &net, false)?;
    let metadata = ModelMetadata::Classifier(ClassifierMetadata {
        categories: categories.clone(),
        trained_at: now_rfc3339(),
        num_samples: embeddings.len(),
        accuracy: final_val_accuracy,
        epochs: epochs_run,
    });
    crate::store::model::save_metadata(model_dir, &metadata)?;
    cache.invalidate();

    Ok(TrainResult {
        accuracy: final_accuracy,
        val_accuracy: final_val_accuracy,
        epochs: epochs_run,
        num_samples: embeddings.len(),
        categories,
    })
}

/// One category with its softmax confidence.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryScore {
    pub category: String,
    pub confidence: f32,
}

/// Prediction for a single embedding: the top category plus every score,
/// sorted by descending confidence.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub category: String,
    pub confidence: f32,
    pub all_scores: Vec<CategoryScore>,
}

struct CacheEntry {
    model_dir: PathBuf,
    network: MlpNetwork,
    metadata: ClassifierMetadata,
}

/// Caller-owned single-entry cache of the last loaded classifier, keyed by
/// the model directory. Invalidate after every (re)train of that location.
#[derive(Default)]
pub struct ModelCache {
    entry: Option<CacheEntry>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    fn holds(&self, model_dir: &Path) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| entry.model_dir == model_dir)
    }
}

/// Predict the category of one embedding using the model at `model_dir`.
///
/// Reuses the cache when it already holds this location; errors with
/// `NotTrained` when no model has been persisted there.
pub fn predict(
    embedding: &[f32],
    model_dir: &Path,
    cache: &mut ModelCache,
) -> Result<Prediction, ModelStoreError> {
    if !cache.holds(model_dir) {
        let (network, metadata) = load_classifier(model_dir)?;
        cache.entry = Some(CacheEntry {
            model_dir: model_dir.to_path_buf(),
            network,
            metadata,
        });
    }
    let entry = cache.entry.as_ref().expect("cache entry just ensured");

    let scores = entry.network.predict_proba(embedding);
    if scores.is_empty() {
        return Err(ModelStoreError::Invalid {
            path: model_dir.join(MODEL_FILE),
            reason: format!(
                "embedding length {} does not match model input {}",
                embedding.len(),
                entry.network.input_len
            ),
        });
    }

    let mut all_scores: Vec<CategoryScore> = entry
        .metadata
        .categories
        .iter()
        .zip(&scores)
        .map(|(category, &confidence)| CategoryScore {
            category: category.clone(),
            confidence,
        })
        .collect();
    all_scores.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let best = &all_scores[0];
    Ok(Prediction {
        category: best.category.clone(),
        confidence: best.confidence,
        all_scores,
    })
}

fn load_classifier(model_dir: &Path) -> Result<(MlpNetwork, ClassifierMetadata), ModelStoreError> {
    let metadata = match load_metadata(model_dir)? {
        ModelMetadata::Classifier(meta) => meta,
        ModelMetadata::Retrieval(_) => {
            return Err(ModelStoreError::Invalid {
                path: model_dir.join(crate::store::model::METADATA_FILE),
                reason: "model at this location is a retrieval model, not a classifier".to_string(),
            });
        }
    };
    let model_path = model_dir.join(MODEL_FILE);
    let network: MlpNetwork = read_json(&model_path)?;
    network
        .validate()
        .map_err(|reason| ModelStoreError::Invalid {
            path: model_path.clone(),
            reason,
        })?;
    if metadata.categories.len() != network.output_len {
        return Err(ModelStoreError::Invalid {
            path: model_path,
            reason: format!(
                "metadata lists {} categories but the network has {} outputs",
                metadata.categories.len(),
                network.output_len
            ),
        });
    }
    Ok((network, metadata))
}

fn sorted_categories(labels: &[String]) -> Vec<String> {
    let mut set = std::collections::BTreeSet::new();
    for label in labels {
        set.insert(label.clone());
    }
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::provider::clustered_embedding;
    use tempfile::tempdir;

    fn clustered_training_data() -> (Vec<Vec<f32>>, Vec<String>) {
        let specs = [
            ("amazing quality", "positive"),
            ("love this", "positive"),
            ("works perfectly", "positive"),
            ("best purchase ever", "positive"),
            ("terrible product", "negative"),
            ("waste of money", "negative"),
            ("broke immediately", "negative"),
            ("very disappointed", "negative"),
            ("it arrived", "neutral"),
            ("does the job", "neutral"),
            ("nothing special", "neutral"),
            ("average product", "neutral"),
        ];
        let embeddings = specs
            .iter()
            .map(|(text, label)| clustered_embedding(text, label))
            .collect();
        let labels = specs.iter().map(|(_, label)| label.to_string()).collect();
        (embeddings, labels)
    }

    #[test]
    fn converges_on_separable_clusters() {
        let dir = tempdir().unwrap();
        let (embeddings, labels) = clustered_training_data();
        let mut cache = ModelCache::new();

        let result = train_classifier(&embeddings, &labels, dir.path(), &mut cache).unwrap();
        assert_eq!(result.categories, ["negative", "neutral", "positive"]);
        assert_eq!(result.num_samples, 12);
        assert!(result.epochs > 0 && result.epochs <= MAX_EPOCHS);
        assert!(
            (result.val_accuracy - 1.0).abs() < 1e-6,
            "validation accuracy was {}",
            result.val_accuracy
        );
    }

    #[test]
    fn held_out_point_predicts_its_cluster_confidently() {
        let dir = tempdir().unwrap();
        let (embeddings, labels) = clustered_training_data();
        let mut cache = ModelCache::new();
        train_classifier(&embeddings, &labels, dir.path(), &mut cache).unwrap();

        let probe = clustered_embedding("fantastic item", "positive");
        let prediction = predict(&probe, dir.path(), &mut cache).unwrap();
        assert_eq!(prediction.category, "positive");
        assert!(
            prediction.confidence > 0.9,
            "confidence was {}",
            prediction.confidence
        );

        let sum: f32 = prediction.all_scores.iter().map(|s| s.confidence).sum();
        assert!((sum - 1.0).abs() < 1e-3);
        assert_eq!(prediction.all_scores.len(), 3);
        assert!(prediction.all_scores[0].confidence >= prediction.all_scores[1].confidence);
    }

    #[test]
    fn predicting_without_a_model_fails() {
        let dir = tempdir().unwrap();
        let mut cache = ModelCache::new();
        let err = predict(&[0.0; 8], dir.path(), &mut cache).unwrap_err();
        assert!(matches!(err, ModelStoreError::NotTrained));
    }

    #[test]
    fn cache_serves_predictions_until_invalidated() {
        let dir = tempdir().unwrap();
        let (embeddings, labels) = clustered_training_data();
        let mut cache = ModelCache::new();
        train_classifier(&embeddings, &labels, dir.path(), &mut cache).unwrap();

        let probe = clustered_embedding("fantastic item", "positive");
        predict(&probe, dir.path(), &mut cache).unwrap();

        // Remove the store; the cached entry keeps serving this location.
        std::fs::remove_file(dir.path().join(MODEL_FILE)).unwrap();
        std::fs::remove_file(dir.path().join(crate::store::model::METADATA_FILE)).unwrap();
        assert!(predict(&probe, dir.path(), &mut cache).is_ok());

        // After invalidation the store is read again and is now gone.
        cache.invalidate();
        assert!(matches!(
            predict(&probe, dir.path(), &mut cache),
            Err(ModelStoreError::NotTrained)
        ));
    }

    #[test]
    fn rejects_single_category_training() {
        let dir = tempdir().unwrap();
        let embeddings = vec![vec![0.0; 4]; 3];
        let labels = vec!["only".to_string(); 3];
        let mut cache = ModelCache::new();
        let err = train_classifier(&embeddings, &labels, dir.path(), &mut cache).unwrap_err();
        assert!(matches!(err, TrainError::TooFewCategories(1)));
    }
}
