//! Nearest-neighbor retrieval model for open-ended outputs.
//!
//! Serves as the classifier substitute for extract/transform tasks: a flat
//! index of stored embeddings queried by cosine similarity. `embeddings[i]`
//! always corresponds to `examples[i]`.

pub mod similarity;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::model::{
    METADATA_FILE, ModelMetadata, ModelStoreError, RETRIEVAL_FILE, RetrievalMetadata, read_json,
    write_json_atomic,
};
use crate::store::now_rfc3339;
use crate::store::samples::Example;
use similarity::find_top_k;

/// Persisted retrieval model: parallel arrays plus build metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalModel {
    pub embeddings: Vec<Vec<f32>>,
    pub examples: Vec<Example>,
    pub trained_at: String,
    pub num_samples: usize,
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Mismatched embeddings ({embeddings}) and examples ({examples})")]
    ParallelArrayMismatch { embeddings: usize, examples: usize },
    #[error("Retrieval model has no stored examples")]
    Empty,
    #[error(transparent)]
    Store(#[from] ModelStoreError),
}

/// One neighbor returned by a query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalMatch {
    pub input: String,
    pub output: String,
    pub similarity: f32,
}

/// Query result: the best match's output with its similarity as confidence,
/// plus the full top-k neighborhood.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalPrediction {
    pub output: String,
    pub confidence: f32,
    pub top_matches: Vec<RetrievalMatch>,
}

/// Assemble a model from parallel arrays, stamping the build time.
pub fn build_retrieval_model(
    embeddings: Vec<Vec<f32>>,
    examples: Vec<Example>,
) -> Result<RetrievalModel, RetrievalError> {
    if embeddings.len() != examples.len() {
        return Err(RetrievalError::ParallelArrayMismatch {
            embeddings: embeddings.len(),
            examples: examples.len(),
        });
    }
    let num_samples = examples.len();
    Ok(RetrievalModel {
        embeddings,
        examples,
        trained_at: now_rfc3339(),
        num_samples,
    })
}

/// Persist the model blob and its metadata atomically.
pub fn save_retrieval_model(
    model_dir: &Path,
    model: &RetrievalModel,
    task: &str,
) -> Result<(), RetrievalError> {
    write_json_atomic(&model_dir.join(RETRIEVAL_FILE), model, false)?;
    let metadata = ModelMetadata::Retrieval(RetrievalMetadata {
        task: task.to_string(),
        trained_at: model.trained_at.clone(),
        num_samples: model.num_samples,
    });
    write_json_atomic(&model_dir.join(METADATA_FILE), &metadata, true)?;
    Ok(())
}

/// Load the persisted model; a missing blob is `NotTrained`.
pub fn load_retrieval_model(model_dir: &Path) -> Result<RetrievalModel, RetrievalError> {
    let model: RetrievalModel = read_json(&model_dir.join(RETRIEVAL_FILE))?;
    if model.embeddings.len() != model.examples.len() {
        return Err(RetrievalError::ParallelArrayMismatch {
            embeddings: model.embeddings.len(),
            examples: model.examples.len(),
        });
    }
    Ok(model)
}

/// Find the `k` nearest stored examples to `query_embedding`.
pub fn query(
    model: &RetrievalModel,
    query_embedding: &[f32],
    k: usize,
) -> Result<RetrievalPrediction, RetrievalError> {
    if model.examples.is_empty() {
        return Err(RetrievalError::Empty);
    }
    let top = find_top_k(query_embedding, &model.embeddings, k);
    let top_matches: Vec<RetrievalMatch> = top
        .iter()
        .map(|m| RetrievalMatch {
            input: model.examples[m.index].input.clone(),
            output: model.examples[m.index].output.clone(),
            similarity: m.similarity,
        })
        .collect();
    let best = &top_matches[0];
    Ok(RetrievalPrediction {
        output: best.output.clone(),
        confidence: best.similarity,
        top_matches,
    })
}

/// Leave-one-out accuracy: for each stored example, does its nearest
/// neighbor among the others produce the same (trimmed) output?
///
/// Quadratic in sample count; fine for the tens-to-low-hundreds this tool
/// targets.
pub fn leave_one_out_accuracy(embeddings: &[Vec<f32>], examples: &[Example]) -> f32 {
    if examples.is_empty() || examples.len() != embeddings.len() {
        return 0.0;
    }
    if examples.len() == 1 {
        return 0.0;
    }
    let mut correct = 0usize;
    for i in 0..examples.len() {
        let mut rest_embeddings = Vec::with_capacity(embeddings.len() - 1);
        let mut rest_examples = Vec::with_capacity(examples.len() - 1);
        for (j, (embedding, example)) in embeddings.iter().zip(examples).enumerate() {
            if j != i {
                rest_embeddings.push(embedding.clone());
                rest_examples.push(example);
            }
        }
        let top = find_top_k(&embeddings[i], &rest_embeddings, 1);
        let predicted = &rest_examples[top[0].index].output;
        if predicted.trim() == examples[i].output.trim() {
            correct += 1;
        }
    }
    correct as f32 / examples.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::provider::clustered_embedding;
    use tempfile::tempdir;

    fn example(id: &str, input: &str, output: &str) -> Example {
        Example {
            id: id.to_string(),
            input: input.to_string(),
            output: output.to_string(),
        }
    }

    fn clustered_fixture() -> (Vec<Vec<f32>>, Vec<Example>) {
        let specs = [
            ("refund please", "billing"),
            ("charge twice", "billing"),
            ("invoice wrong", "billing"),
            ("overbilled me", "billing"),
            ("app crashes", "bug"),
            ("login broken", "bug"),
            ("page errors out", "bug"),
            ("save fails", "bug"),
            ("add dark mode", "feature"),
            ("want csv export", "feature"),
            ("support webhooks", "feature"),
            ("need api keys", "feature"),
        ];
        let examples: Vec<Example> = specs
            .iter()
            .enumerate()
            .map(|(i, (input, output))| example(&format!("{:03}", i + 1), input, output))
            .collect();
        let embeddings = specs
            .iter()
            .map(|(input, output)| clustered_embedding(input, output))
            .collect();
        (embeddings, examples)
    }

    #[test]
    fn build_rejects_mismatched_arrays() {
        let err = build_retrieval_model(vec![vec![0.0; 4]], Vec::new()).unwrap_err();
        assert!(matches!(err, RetrievalError::ParallelArrayMismatch { .. }));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let (embeddings, examples) = clustered_fixture();
        let model = build_retrieval_model(embeddings, examples).unwrap();
        save_retrieval_model(dir.path(), &model, "extract").unwrap();

        let loaded = load_retrieval_model(dir.path()).unwrap();
        assert_eq!(loaded.num_samples, 12);
        assert_eq!(loaded.examples[0].output, "billing");

        let metadata = crate::store::model::load_metadata(dir.path()).unwrap();
        assert!(matches!(metadata, ModelMetadata::Retrieval(_)));
    }

    #[test]
    fn missing_model_is_not_trained() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_retrieval_model(dir.path()),
            Err(RetrievalError::Store(ModelStoreError::NotTrained))
        ));
    }

    #[test]
    fn stored_embedding_queries_itself_back() {
        let (embeddings, examples) = clustered_fixture();
        let probe = embeddings[4].clone();
        let model = build_retrieval_model(embeddings, examples).unwrap();

        let prediction = query(&model, &probe, 3).unwrap();
        assert_eq!(prediction.output, "bug");
        assert!((prediction.confidence - 1.0).abs() < 1e-5);
        assert_eq!(prediction.top_matches.len(), 3);
    }

    #[test]
    fn query_caps_k_at_model_size() {
        let (embeddings, examples) = clustered_fixture();
        let probe = embeddings[0].clone();
        let model = build_retrieval_model(embeddings, examples).unwrap();
        let prediction = query(&model, &probe, 50).unwrap();
        assert_eq!(prediction.top_matches.len(), 12);
    }

    #[test]
    fn leave_one_out_accuracy_high_for_separated_clusters() {
        let (embeddings, examples) = clustered_fixture();
        let accuracy = leave_one_out_accuracy(&embeddings, &examples);
        assert!((0.0..=1.0).contains(&accuracy));
        assert!(accuracy >= 0.8, "accuracy was {accuracy}");
    }

    #[test]
    fn leave_one_out_degenerate_sizes() {
        assert_eq!(leave_one_out_accuracy(&[], &[]), 0.0);
        let one = vec![example("001", "a", "x")];
        assert_eq!(leave_one_out_accuracy(&[vec![1.0, 0.0]], &one), 0.0);
    }
}
