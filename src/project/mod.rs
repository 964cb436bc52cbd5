//! Project discovery and on-disk layout.
//!
//! A project is a directory containing `exemplar.toml` with `samples/`,
//! `model/`, and `review/` subdirectories plus a hidden `.exemplar/` area
//! for internal files such as the embedding cache.

pub mod config;

use std::path::{Path, PathBuf};

pub use config::{CONFIG_FILE_NAME, ProjectConfig, ProjectError, TaskKind};

/// Directory holding `<id>.input.<ext>` / `<id>.output.<ext>` pairs.
pub const SAMPLES_DIR: &str = "samples";
/// Directory holding the persisted model blobs and metadata.
pub const MODEL_DIR: &str = "model";
/// Directory holding the review snapshot.
pub const REVIEW_DIR: &str = "review";
/// Hidden directory for internal files.
pub const INTERNAL_DIR: &str = ".exemplar";

/// An opened project: its root directory plus the decoded configuration.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
}

impl Project {
    /// Open the project rooted at `dir` without searching parents.
    pub fn open(dir: &Path) -> Result<Self, ProjectError> {
        let config = config::read_config(dir)?;
        Ok(Self {
            root: dir.to_path_buf(),
            config,
        })
    }

    /// Walk upward from `start` until a directory containing
    /// `exemplar.toml` is found.
    pub fn discover(start: &Path) -> Result<Self, ProjectError> {
        let mut dir = start.to_path_buf();
        loop {
            if dir.join(CONFIG_FILE_NAME).is_file() {
                return Self::open(&dir);
            }
            if !dir.pop() {
                return Err(ProjectError::NotFound {
                    start: start.to_path_buf(),
                });
            }
        }
    }

    /// Discover the project enclosing the current working directory.
    pub fn discover_from_cwd() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir().map_err(|source| ProjectError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        Self::discover(&cwd)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.root.join(SAMPLES_DIR)
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join(MODEL_DIR)
    }

    pub fn review_path(&self) -> PathBuf {
        self.root.join(REVIEW_DIR).join("results.json")
    }

    pub fn internal_dir(&self) -> PathBuf {
        self.root.join(INTERNAL_DIR)
    }

    pub fn embeddings_cache_path(&self) -> PathBuf {
        self.internal_dir().join("embeddings_cache.json")
    }
}

/// Scaffold a new project directory with its configuration and layout.
///
/// Fails if `root` already contains an `exemplar.toml`.
pub fn init_project(root: &Path, config: &ProjectConfig) -> Result<Project, ProjectError> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.is_file() {
        return Err(ProjectError::Write {
            path: config_path,
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "project already initialized",
            ),
        });
    }
    for sub in [SAMPLES_DIR, MODEL_DIR, REVIEW_DIR, INTERNAL_DIR] {
        let dir = root.join(sub);
        std::fs::create_dir_all(&dir)
            .map_err(|source| ProjectError::Write { path: dir, source })?;
    }
    config::write_config(root, config)?;
    Project::open(root)
}
