//! `exemplar export`: copy the trained model to a standalone directory.
//!
//! Copies the persisted model files (not the archive) plus a small manifest
//! describing the project and model, for consumption by external serving
//! tooling.

use std::path::{Path, PathBuf};

use crate::project::Project;
use crate::store::model::{load_metadata, write_json_atomic};
use crate::store::now_rfc3339;

use super::CliError;

pub fn run(args: &[String]) -> Result<(), CliError> {
    let Some(output) = args.first() else {
        return Err(CliError::Usage("Usage: exemplar export <dir>".to_string()));
    };
    let output_dir = PathBuf::from(output);

    let project = Project::discover_from_cwd()?;
    let metadata = load_metadata(&project.model_dir())?;

    std::fs::create_dir_all(&output_dir).map_err(|source| CliError::Io {
        path: output_dir.clone(),
        source,
    })?;

    let copied = copy_model_files(&project.model_dir(), &output_dir)?;

    let manifest = serde_json::json!({
        "name": project.config().name,
        "task": project.config().task.as_str(),
        "exported_at": now_rfc3339(),
        "metadata": metadata,
    });
    write_json_atomic(&output_dir.join("export.json"), &manifest, true)?;

    println!(
        "Exported {} model file(s) to {}",
        copied,
        output_dir.display()
    );
    Ok(())
}

fn copy_model_files(model_dir: &Path, output_dir: &Path) -> Result<usize, CliError> {
    let entries = std::fs::read_dir(model_dir).map_err(|source| CliError::Io {
        path: model_dir.to_path_buf(),
        source,
    })?;
    let mut copied = 0usize;
    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        // The archive subdirectory is skipped along with anything else that
        // is not a plain file.
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        std::fs::copy(&path, output_dir.join(name)).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
        copied += 1;
    }
    Ok(copied)
}
