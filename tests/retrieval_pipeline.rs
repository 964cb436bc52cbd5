//! End-to-end retrieval pipeline: embed through the cache, build, persist,
//! query, and self-evaluate.

mod support;

use support::{EXTRACT_SAMPLES, add_samples, create_test_project};

use exemplar::embedding::{EmbeddingCache, HashedEmbeddingProvider, provider::clustered_embedding};
use exemplar::project::TaskKind;
use exemplar::retrieval::{
    build_retrieval_model, leave_one_out_accuracy, load_retrieval_model, query,
    save_retrieval_model,
};
use exemplar::store::samples::load_examples;

#[test]
fn builds_saves_and_queries_a_retrieval_model() {
    let fixture = create_test_project(TaskKind::Extract);
    add_samples(&fixture.project.samples_dir(), EXTRACT_SAMPLES);

    let examples = load_examples(&fixture.project.samples_dir()).unwrap();
    let embeddings: Vec<Vec<f32>> = examples
        .iter()
        .map(|e| clustered_embedding(&e.input, &e.output))
        .collect();

    let model = build_retrieval_model(embeddings.clone(), examples.clone()).unwrap();
    save_retrieval_model(&fixture.project.model_dir(), &model, "extract").unwrap();

    let loaded = load_retrieval_model(&fixture.project.model_dir()).unwrap();
    assert_eq!(loaded.num_samples, 12);
    assert_eq!(loaded.embeddings.len(), loaded.examples.len());

    // A stored embedding should find itself with similarity ~1.
    let prediction = query(&loaded, &embeddings[0], 3).unwrap();
    assert_eq!(prediction.output, examples[0].output);
    assert!((prediction.confidence - 1.0).abs() < 1e-5);
    assert_eq!(prediction.top_matches.len(), 3);
    for pair in prediction.top_matches.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[test]
fn nearby_query_lands_in_the_right_cluster() {
    let examples = load_fixture_examples();
    let embeddings: Vec<Vec<f32>> = examples
        .iter()
        .map(|e| clustered_embedding(&e.input, &e.output))
        .collect();
    let model = build_retrieval_model(embeddings, examples).unwrap();

    let probe = clustered_embedding("my card was billed two times", "billing");
    let prediction = query(&model, &probe, 1).unwrap();
    assert_eq!(prediction.output, "billing");
}

#[test]
fn leave_one_out_accuracy_is_high_on_separated_clusters() {
    let examples = load_fixture_examples();
    let embeddings: Vec<Vec<f32>> = examples
        .iter()
        .map(|e| clustered_embedding(&e.input, &e.output))
        .collect();

    let accuracy = leave_one_out_accuracy(&embeddings, &examples);
    assert!((0.0..=1.0).contains(&accuracy));
    assert!(accuracy >= 0.8, "accuracy was {accuracy}");
}

#[test]
fn embedding_cache_feeds_the_pipeline_consistently() {
    let fixture = create_test_project(TaskKind::Extract);
    add_samples(&fixture.project.samples_dir(), EXTRACT_SAMPLES);
    let examples = load_examples(&fixture.project.samples_dir()).unwrap();

    let provider = HashedEmbeddingProvider;
    let cache = EmbeddingCache::new(fixture.project.embeddings_cache_path());
    let inputs: Vec<String> = examples.iter().map(|e| e.input.clone()).collect();

    let first = cache.embed_texts(&provider, &inputs).unwrap();
    let second = cache.embed_texts(&provider, &inputs).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.len().unwrap(), 12);
    assert!(fixture.project.embeddings_cache_path().is_file());
}

fn load_fixture_examples() -> Vec<exemplar::store::samples::Example> {
    EXTRACT_SAMPLES
        .iter()
        .enumerate()
        .map(|(i, (input, output))| exemplar::store::samples::Example {
            id: format!("{:03}", i + 1),
            input: input.to_string(),
            output: output.to_string(),
        })
        .collect()
}
