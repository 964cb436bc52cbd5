//! `exemplar predict`: run one input through the trained model.
//!
//! The argument is treated as a file path when it names an existing file,
//! otherwise as the input text itself.

use std::path::Path;

use crate::embedding::EmbeddingCache;
use crate::project::Project;
use crate::retrieval::{self, load_retrieval_model};
use crate::train::{self, ModelCache};

use super::{CliError, percent, print_table, provider_for};

pub fn run(args: &[String]) -> Result<(), CliError> {
    let Some(input_arg) = args.first() else {
        return Err(CliError::Usage(
            "Usage: exemplar predict <text-or-file>".to_string(),
        ));
    };
    let input = resolve_input(input_arg)?;

    let project = Project::discover_from_cwd()?;
    let provider = provider_for(project.config())?;
    let cache = EmbeddingCache::new(project.embeddings_cache_path());
    let embedding = cache.embed_text(provider.as_ref(), &input)?;

    if project.config().task.uses_classifier() {
        let mut model_cache = ModelCache::new();
        let prediction = train::predict(&embedding, &project.model_dir(), &mut model_cache)?;
        println!("{}", prediction.category);
        let rows: Vec<(&str, String)> = prediction
            .all_scores
            .iter()
            .map(|score| (score.category.as_str(), percent(score.confidence)))
            .collect();
        print_table(&rows);
    } else {
        let model = load_retrieval_model(&project.model_dir())?;
        let prediction = retrieval::query(&model, &embedding, 3)?;
        println!("{}", prediction.output);
        println!("  confidence {}", percent(prediction.confidence));
        for neighbor in &prediction.top_matches {
            println!(
                "  {}  \"{}\" -> \"{}\"",
                percent(neighbor.similarity),
                truncate(&neighbor.input, 48),
                truncate(&neighbor.output, 32)
            );
        }
    }
    Ok(())
}

fn resolve_input(arg: &str) -> Result<String, CliError> {
    let path = Path::new(arg);
    if path.is_file() {
        return std::fs::read_to_string(path)
            .map(|raw| raw.trim().to_string())
            .map_err(|source| CliError::ReadInput {
                path: path.to_path_buf(),
                source,
            });
    }
    Ok(arg.trim().to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}…")
}
