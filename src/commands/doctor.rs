//! `exemplar doctor`: environment and project diagnostics.

use crate::embedding::EmbeddingCache;
use crate::project::Project;
use crate::store::model::{ModelStoreError, load_metadata};
use crate::store::samples;

use super::{CliError, provider_for};

enum Status {
    Pass,
    Warn,
    Fail,
}

struct Check {
    name: &'static str,
    status: Status,
    message: String,
}

pub fn run() -> Result<(), CliError> {
    let project = Project::discover_from_cwd()?;
    let mut checks = Vec::new();

    checks.push(Check {
        name: "Project",
        status: Status::Pass,
        message: format!(
            "\"{}\" ({}) at {}",
            project.config().name,
            project.config().task,
            project.root().display()
        ),
    });

    let examples = samples::load_examples(&project.samples_dir())?;
    let need = project.config().task.min_samples();
    checks.push(if examples.len() >= need {
        Check {
            name: "Training samples",
            status: Status::Pass,
            message: format!("{} (>= {need} required)", examples.len()),
        }
    } else {
        Check {
            name: "Training samples",
            status: Status::Warn,
            message: format!("{} of {need} required for training", examples.len()),
        }
    });

    match provider_for(project.config()) {
        Ok(provider) => {
            let probe = vec!["diagnostic probe".to_string()];
            match provider.embed_batch(&probe) {
                Ok(_) => checks.push(Check {
                    name: "Embedding provider",
                    status: Status::Pass,
                    message: provider.describe(),
                }),
                Err(err) => checks.push(Check {
                    name: "Embedding provider",
                    status: Status::Fail,
                    message: format!("{}: {err}", provider.describe()),
                }),
            }
        }
        Err(err) => checks.push(Check {
            name: "Embedding provider",
            status: Status::Fail,
            message: err.to_string(),
        }),
    }

    match load_metadata(&project.model_dir()) {
        Ok(metadata) => checks.push(Check {
            name: "Trained model",
            status: Status::Pass,
            message: format!(
                "{} sample(s), trained at {}",
                metadata.num_samples(),
                metadata.trained_at()
            ),
        }),
        Err(ModelStoreError::NotTrained) => checks.push(Check {
            name: "Trained model",
            status: Status::Warn,
            message: "Not trained yet. Run \"exemplar train\".".to_string(),
        }),
        Err(err) => checks.push(Check {
            name: "Trained model",
            status: Status::Fail,
            message: err.to_string(),
        }),
    }

    let cache = EmbeddingCache::new(project.embeddings_cache_path());
    match cache.len() {
        Ok(entries) => checks.push(Check {
            name: "Embedding cache",
            status: Status::Pass,
            message: format!("{entries} cached vector(s)"),
        }),
        Err(err) => checks.push(Check {
            name: "Embedding cache",
            status: Status::Fail,
            message: err.to_string(),
        }),
    }

    let mut failed = false;
    for check in &checks {
        let tag = match check.status {
            Status::Pass => "ok  ",
            Status::Warn => "warn",
            Status::Fail => {
                failed = true;
                "FAIL"
            }
        };
        println!("[{tag}] {:<20} {}", check.name, check.message);
    }
    if failed {
        return Err(CliError::Usage(
            "One or more checks failed; see above.".to_string(),
        ));
    }
    Ok(())
}
