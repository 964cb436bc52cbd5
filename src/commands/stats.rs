//! `exemplar stats`: summarize the project state.

use std::path::Path;

use crate::embedding::EmbeddingCache;
use crate::project::Project;
use crate::store::model::{ModelMetadata, ModelStoreError, load_metadata};
use crate::store::review;
use crate::store::samples;

use super::{CliError, percent, print_table};

pub fn run() -> Result<(), CliError> {
    let project = Project::discover_from_cwd()?;
    let examples = samples::load_examples(&project.samples_dir())?;
    let snapshot = review::load_snapshot(&project.review_path())?;

    println!("Project \"{}\"", project.config().name);

    let mut rows: Vec<(&str, String)> = vec![
        ("Task", project.config().task.to_string()),
        ("Training samples", examples.len().to_string()),
    ];

    match load_metadata(&project.model_dir()) {
        Ok(metadata) => {
            rows.push(("Last trained", metadata.trained_at().to_string()));
            if let Some(accuracy) = metadata.accuracy() {
                rows.push(("Model accuracy", percent(accuracy)));
            }
            if let ModelMetadata::Classifier(meta) = &metadata {
                rows.push(("Categories", meta.categories.join(", ")));
            }
            rows.push(("Model size", format_bytes(directory_size(&project.model_dir()))));
        }
        Err(ModelStoreError::NotTrained) => rows.push(("Model", "Not trained yet".to_string())),
        Err(err) => return Err(err.into()),
    }

    let reviewed = snapshot.reviewed().count();
    let approved = snapshot.reviewed().filter(|item| item.approved).count();
    rows.push(("Review items", snapshot.items.len().to_string()));
    rows.push(("Reviewed", reviewed.to_string()));
    if reviewed > 0 {
        rows.push((
            "Approval rate",
            percent(approved as f32 / reviewed as f32),
        ));
    }

    let cache = EmbeddingCache::new(project.embeddings_cache_path());
    rows.push(("Cached embeddings", cache.len()?.to_string()));

    print_table(&rows);
    Ok(())
}

fn directory_size(dir: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut total = 0u64;
    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        if path.is_dir() {
            total += directory_size(&path);
        } else if let Ok(metadata) = entry.metadata() {
            total += metadata.len();
        }
    }
    total
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
