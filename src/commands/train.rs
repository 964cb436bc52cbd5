//! `exemplar train`: fit a model on the authored examples.

use std::time::Instant;

use crate::embedding::EmbeddingCache;
use crate::project::Project;
use crate::retrieval::{build_retrieval_model, leave_one_out_accuracy, save_retrieval_model};
use crate::store::samples::{self, Example};
use crate::train::{ModelCache, TrainError, train_classifier};

use super::{CliError, percent, print_table, provider_for};

pub fn run() -> Result<(), CliError> {
    let project = Project::discover_from_cwd()?;
    let examples = samples::load_examples(&project.samples_dir())?;

    let need = project.config().task.min_samples();
    if examples.len() < need {
        return Err(TrainError::InsufficientSamples {
            have: examples.len(),
            need,
        }
        .into());
    }

    println!(
        "Training {} model \"{}\" on {} examples",
        project.config().task,
        project.config().name,
        examples.len()
    );
    train_on_examples(&project, &examples)?;
    println!("Model saved to model/");
    Ok(())
}

/// Embed the examples, fit the task-appropriate model, print the metrics
/// table, and return the headline accuracy. Shared with `retrain`.
pub(crate) fn train_on_examples(project: &Project, examples: &[Example]) -> Result<f32, CliError> {
    let provider = provider_for(project.config())?;
    let cache = EmbeddingCache::new(project.embeddings_cache_path());

    let started = Instant::now();
    let inputs: Vec<String> = examples.iter().map(|e| e.input.clone()).collect();
    let embeddings = cache.embed_texts(provider.as_ref(), &inputs)?;

    let accuracy = if project.config().task.uses_classifier() {
        let labels: Vec<String> = examples.iter().map(|e| e.output.clone()).collect();
        let mut model_cache = ModelCache::new();
        let result = train_classifier(&embeddings, &labels, &project.model_dir(), &mut model_cache)?;

        print_table(&[
            ("Samples", result.num_samples.to_string()),
            ("Categories", result.categories.join(", ")),
            ("Training accuracy", percent(result.accuracy)),
            ("Validation accuracy", percent(result.val_accuracy)),
            ("Epochs", result.epochs.to_string()),
            ("Time elapsed", format!("{:.1}s", started.elapsed().as_secs_f32())),
        ]);
        result.val_accuracy
    } else {
        let model = build_retrieval_model(embeddings.clone(), examples.to_vec())?;
        save_retrieval_model(
            &project.model_dir(),
            &model,
            project.config().task.as_str(),
        )?;
        let accuracy = leave_one_out_accuracy(&embeddings, examples);

        print_table(&[
            ("Samples", examples.len().to_string()),
            ("Task", project.config().task.to_string()),
            ("Leave-one-out accuracy", percent(accuracy)),
            ("Time elapsed", format!("{:.1}s", started.elapsed().as_secs_f32())),
        ]);
        accuracy
    };

    if accuracy < 0.6 {
        tracing::warn!(
            "Model accuracy is low ({:.0}%). Consider adding more diverse training examples.",
            accuracy * 100.0
        );
    }
    Ok(accuracy)
}
