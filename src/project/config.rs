//! Project configuration stored as `exemplar.toml` at the project root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default filename used to store the project configuration.
pub const CONFIG_FILE_NAME: &str = "exemplar.toml";

/// Errors raised while locating or decoding a project configuration.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// No `exemplar.toml` was found here or in any parent directory.
    #[error(
        "Not inside an exemplar project (searched upward from {start}). Run \"exemplar init <name>\" to create one."
    )]
    NotFound { start: PathBuf },
    /// Failed to read the configuration file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file exists but cannot be decoded.
    #[error("Corrupted project config {path}: {source}")]
    Corrupted {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    /// Failed to encode the configuration for writing.
    #[error("Failed to encode project config: {0}")]
    Encode(#[from] toml::ser::Error),
    /// Failed to write the configuration file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Kind of task the project trains for.
///
/// `classify` maps to the classifier path; `extract` and `transform` produce
/// open-ended outputs and use the retrieval model instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Classify,
    Extract,
    Transform,
}

impl TaskKind {
    /// Whether this task trains the finite-category classifier.
    pub fn uses_classifier(self) -> bool {
        matches!(self, TaskKind::Classify)
    }

    /// Minimum number of training examples required before (re)training.
    pub fn min_samples(self) -> usize {
        if self.uses_classifier() { 10 } else { 20 }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "classify" => Some(TaskKind::Classify),
            "extract" => Some(TaskKind::Extract),
            "transform" => Some(TaskKind::Transform),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Classify => "classify",
            TaskKind::Extract => "extract",
            TaskKind::Transform => "transform",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project settings loaded from `exemplar.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub task: TaskKind,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    pub version: String,
    /// Optional URL of an embedding inference endpoint. When absent, the
    /// deterministic offline provider is used.
    #[serde(default)]
    pub embedding_endpoint: Option<String>,
}

/// Read the configuration at `<dir>/exemplar.toml`.
pub fn read_config(dir: &Path) -> Result<ProjectConfig, ProjectError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        return Err(ProjectError::NotFound {
            start: dir.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(&path).map_err(|source| ProjectError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ProjectError::Corrupted {
        path,
        source: Box::new(source),
    })
}

/// Write the configuration to `<dir>/exemplar.toml`.
pub fn write_config(dir: &Path, config: &ProjectConfig) -> Result<(), ProjectError> {
    let path = dir.join(CONFIG_FILE_NAME);
    let encoded = toml::to_string_pretty(config)?;
    std::fs::write(&path, encoded).map_err(|source| ProjectError::Write { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_config() -> ProjectConfig {
        ProjectConfig {
            name: "sentiment".to_string(),
            task: TaskKind::Classify,
            description: String::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            version: "1".to_string(),
            embedding_endpoint: None,
        }
    }

    #[test]
    fn round_trips_config() {
        let dir = tempdir().unwrap();
        write_config(dir.path(), &sample_config()).unwrap();
        let loaded = read_config(dir.path()).unwrap();
        assert_eq!(loaded.name, "sentiment");
        assert_eq!(loaded.task, TaskKind::Classify);
        assert!(loaded.embedding_endpoint.is_none());
    }

    #[test]
    fn missing_config_reports_not_found() {
        let dir = tempdir().unwrap();
        let err = read_config(dir.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn min_samples_depend_on_task_kind() {
        assert_eq!(TaskKind::Classify.min_samples(), 10);
        assert_eq!(TaskKind::Extract.min_samples(), 20);
        assert_eq!(TaskKind::Transform.min_samples(), 20);
    }
}
