//! `exemplar review`: manage the review queue from the terminal.
//!
//! `pending` predicts an output for every example that has no review item
//! yet and persists the snapshot; `approve`/`reject` record a verdict and
//! rewrite the snapshot in full.

use crate::embedding::EmbeddingCache;
use crate::project::Project;
use crate::retrieval::{self, load_retrieval_model};
use crate::store::review::{self, ReviewItem};
use crate::store::samples;
use crate::store::now_rfc3339;
use crate::train::ModelCache;

use super::{CliError, provider_for};

pub fn run(args: &[String]) -> Result<(), CliError> {
    let Some(action) = args.first() else {
        return Err(usage());
    };
    let project = Project::discover_from_cwd()?;
    match action.as_str() {
        "pending" => pending(&project),
        "list" => list(&project),
        "approve" => {
            let id = args.get(1).ok_or_else(usage)?;
            verdict(&project, id, true, None)
        }
        "reject" => {
            let id = args.get(1).ok_or_else(usage)?;
            let correction = parse_correction(&args[2..])?;
            verdict(&project, id, false, correction)
        }
        unknown => Err(CliError::Usage(format!(
            "Unknown review action: {unknown}\n\n{}",
            usage_text()
        ))),
    }
}

fn pending(project: &Project) -> Result<(), CliError> {
    let examples = samples::load_examples(&project.samples_dir())?;
    if examples.is_empty() {
        return Err(CliError::Usage(
            "No examples found. Add training data first with \"exemplar add\".".to_string(),
        ));
    }

    let review_path = project.review_path();
    let mut snapshot = review::load_snapshot(&review_path)?;

    let provider = provider_for(project.config())?;
    let cache = EmbeddingCache::new(project.embeddings_cache_path());
    let mut model_cache = ModelCache::new();
    let retrieval_model = if project.config().task.uses_classifier() {
        None
    } else {
        Some(load_retrieval_model(&project.model_dir())?)
    };

    let mut created = 0usize;
    for example in &examples {
        if snapshot.contains(&example.id) {
            continue;
        }
        let embedding = cache.embed_text(provider.as_ref(), &example.input)?;
        let predicted_output = match &retrieval_model {
            None => {
                crate::train::predict(&embedding, &project.model_dir(), &mut model_cache)?.category
            }
            Some(model) => retrieval::query(model, &embedding, 1)?.output,
        };
        snapshot.items.push(ReviewItem {
            id: example.id.clone(),
            input: example.input.clone(),
            predicted_output,
            approved: false,
            corrected_output: None,
            reviewed_at: None,
        });
        created += 1;
    }
    review::save_snapshot(&review_path, &snapshot)?;

    println!("{created} new prediction(s) queued for review.");
    let open: Vec<&ReviewItem> = snapshot
        .items
        .iter()
        .filter(|item| !item.is_reviewed())
        .collect();
    if open.is_empty() {
        println!("Nothing awaiting review.");
    } else {
        println!("Awaiting review:");
        for item in open {
            println!(
                "  {}  \"{}\" -> \"{}\"",
                item.id,
                truncate(&item.input, 48),
                truncate(&item.predicted_output, 32)
            );
        }
        println!("Use \"exemplar review approve <id>\" or \"exemplar review reject <id> [--correction <text>]\".");
    }
    Ok(())
}

fn list(project: &Project) -> Result<(), CliError> {
    let snapshot = review::load_snapshot(&project.review_path())?;
    if snapshot.items.is_empty() {
        println!("No review items yet. Run \"exemplar review pending\" first.");
        return Ok(());
    }
    for item in &snapshot.items {
        let status = match (&item.reviewed_at, item.approved, &item.corrected_output) {
            (None, ..) => "pending".to_string(),
            (Some(_), true, _) => "approved".to_string(),
            (Some(_), false, Some(correction)) => {
                format!("rejected, corrected to \"{}\"", truncate(correction, 32))
            }
            (Some(_), false, None) => "rejected".to_string(),
        };
        println!(
            "  {}  \"{}\" -> \"{}\"  [{status}]",
            item.id,
            truncate(&item.input, 48),
            truncate(&item.predicted_output, 32)
        );
    }
    Ok(())
}

fn verdict(
    project: &Project,
    id: &str,
    approved: bool,
    correction: Option<String>,
) -> Result<(), CliError> {
    let review_path = project.review_path();
    let mut snapshot = review::load_snapshot(&review_path)?;
    let Some(item) = snapshot.find_mut(id) else {
        return Err(CliError::Usage(format!(
            "No review item with id {id}. Run \"exemplar review pending\" first."
        )));
    };
    item.approved = approved;
    item.corrected_output = correction;
    item.reviewed_at = Some(now_rfc3339());
    review::save_snapshot(&review_path, &snapshot)?;
    println!("Item {id} {}.", if approved { "approved" } else { "rejected" });
    Ok(())
}

fn parse_correction(args: &[String]) -> Result<Option<String>, CliError> {
    match args {
        [] => Ok(None),
        [flag, value] if flag == "--correction" => Ok(Some(value.clone())),
        [flag] if flag == "--correction" => {
            Err(CliError::Usage("--correction requires a value".to_string()))
        }
        _ => Err(usage()),
    }
}

fn usage() -> CliError {
    CliError::Usage(usage_text())
}

fn usage_text() -> String {
    "Usage: exemplar review pending | list | approve <id> | reject <id> [--correction <text>]"
        .to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}…")
}
