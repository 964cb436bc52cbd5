//! End-to-end classifier pipeline over a scratch project: load, embed,
//! train, persist, predict.

mod support;

use support::{CLASSIFY_SAMPLES, add_samples, create_test_project};

use exemplar::embedding::provider::clustered_embedding;
use exemplar::project::{self, TaskKind};
use exemplar::store::model::{MODEL_FILE, METADATA_FILE, ModelMetadata, ModelStoreError};
use exemplar::store::samples::{load_examples, unique_output_categories};
use exemplar::train::{ModelCache, predict, train_classifier};

fn clustered_training_inputs() -> (Vec<Vec<f32>>, Vec<String>) {
    let embeddings = CLASSIFY_SAMPLES
        .iter()
        .map(|(input, output)| clustered_embedding(input, output))
        .collect();
    let labels = CLASSIFY_SAMPLES
        .iter()
        .map(|(_, output)| output.to_string())
        .collect();
    (embeddings, labels)
}

#[test]
fn loads_config_and_samples() {
    let fixture = create_test_project(TaskKind::Classify);
    add_samples(&fixture.project.samples_dir(), CLASSIFY_SAMPLES);

    let reopened = project::Project::discover(&fixture.root).unwrap();
    assert_eq!(reopened.config().name, "test-project");
    assert_eq!(reopened.config().task, TaskKind::Classify);

    let examples = load_examples(&reopened.samples_dir()).unwrap();
    assert_eq!(examples.len(), 12);
    assert_eq!(
        unique_output_categories(&examples),
        ["negative", "neutral", "positive"]
    );
}

#[test]
fn trains_and_persists_model_files() {
    let fixture = create_test_project(TaskKind::Classify);
    let (embeddings, labels) = clustered_training_inputs();
    let mut cache = ModelCache::new();

    let result =
        train_classifier(&embeddings, &labels, &fixture.project.model_dir(), &mut cache).unwrap();

    assert_eq!(result.num_samples, 12);
    assert_eq!(result.categories, ["negative", "neutral", "positive"]);
    assert!(result.epochs > 0);
    assert!((0.0..=1.0).contains(&result.accuracy));
    assert!((0.0..=1.0).contains(&result.val_accuracy));

    let model_dir = fixture.project.model_dir();
    assert!(model_dir.join(MODEL_FILE).is_file());
    assert!(model_dir.join(METADATA_FILE).is_file());

    match exemplar::store::model::load_metadata(&model_dir).unwrap() {
        ModelMetadata::Classifier(meta) => {
            assert_eq!(meta.categories, ["negative", "neutral", "positive"]);
            assert_eq!(meta.num_samples, 12);
            assert_eq!(meta.epochs, result.epochs);
        }
        ModelMetadata::Retrieval(_) => panic!("expected classifier metadata"),
    }
}

#[test]
fn predicts_each_cluster_correctly_after_training() {
    let fixture = create_test_project(TaskKind::Classify);
    let (embeddings, labels) = clustered_training_inputs();
    let mut cache = ModelCache::new();
    train_classifier(&embeddings, &labels, &fixture.project.model_dir(), &mut cache).unwrap();

    for (text, expected) in [
        ("Great stuff", "positive"),
        ("Horrible stuff", "negative"),
        ("Okay stuff", "neutral"),
    ] {
        let probe = clustered_embedding(text, expected);
        let prediction = predict(&probe, &fixture.project.model_dir(), &mut cache).unwrap();
        assert_eq!(prediction.category, expected);
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
        assert_eq!(prediction.all_scores.len(), 3);

        let sum: f32 = prediction.all_scores.iter().map(|s| s.confidence).sum();
        assert!((sum - 1.0).abs() < 1e-2);
    }
}

#[test]
fn predicting_without_training_reports_not_trained() {
    let fixture = create_test_project(TaskKind::Classify);
    let mut cache = ModelCache::new();
    let probe = clustered_embedding("anything", "positive");
    let err = predict(&probe, &fixture.project.model_dir(), &mut cache).unwrap_err();
    assert!(matches!(err, ModelStoreError::NotTrained));
}

#[test]
fn retraining_twice_keeps_sample_count_and_timestamp_order() {
    let fixture = create_test_project(TaskKind::Classify);
    let (embeddings, labels) = clustered_training_inputs();
    let mut cache = ModelCache::new();

    train_classifier(&embeddings, &labels, &fixture.project.model_dir(), &mut cache).unwrap();
    let first = exemplar::store::model::load_metadata(&fixture.project.model_dir()).unwrap();

    train_classifier(&embeddings, &labels, &fixture.project.model_dir(), &mut cache).unwrap();
    let second = exemplar::store::model::load_metadata(&fixture.project.model_dir()).unwrap();

    assert_eq!(first.num_samples(), second.num_samples());
    // RFC 3339 timestamps compare lexicographically.
    assert!(second.trained_at() >= first.trained_at());
}
