//! Shared fixtures for the integration suites: a throwaway project on disk
//! plus deterministic clustered sample data.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use exemplar::project::{self, Project, ProjectConfig, TaskKind};
use exemplar::store::samples;

/// A scratch project rooted in a tempdir; everything is removed on drop.
pub struct TestProject {
    _dir: TempDir,
    pub root: PathBuf,
    pub project: Project,
}

pub fn create_test_project(task: TaskKind) -> TestProject {
    let dir = TempDir::new().expect("create tempdir");
    let root = dir.path().to_path_buf();
    let config = ProjectConfig {
        name: "test-project".to_string(),
        task,
        description: String::new(),
        created_at: "2026-01-01T00:00:00Z".to_string(),
        version: "1".to_string(),
        embedding_endpoint: None,
    };
    let project = project::init_project(&root, &config).expect("init project");
    TestProject {
        _dir: dir,
        root,
        project,
    }
}

/// Twelve sentiment samples, four per category.
pub const CLASSIFY_SAMPLES: &[(&str, &str)] = &[
    ("This product is amazing", "positive"),
    ("I love it so much", "positive"),
    ("Best purchase I ever made", "positive"),
    ("Works perfectly every time", "positive"),
    ("Terrible quality, very disappointed", "negative"),
    ("Complete waste of money", "negative"),
    ("It broke after one day", "negative"),
    ("Worst product ever", "negative"),
    ("It arrived on schedule", "neutral"),
    ("The package contains one unit", "neutral"),
    ("It is a product that exists", "neutral"),
    ("Delivered in a cardboard box", "neutral"),
];

/// Twelve open-ended extraction samples across three well-separated topics.
pub const EXTRACT_SAMPLES: &[(&str, &str)] = &[
    ("Please refund my last invoice", "billing"),
    ("I was charged twice this month", "billing"),
    ("The invoice total looks wrong", "billing"),
    ("Why did my subscription price change", "billing"),
    ("The app crashes on startup", "bug"),
    ("Login fails with an error page", "bug"),
    ("Saving a draft loses my text", "bug"),
    ("The export button does nothing", "bug"),
    ("Please add a dark mode", "feature"),
    ("Could you support CSV export", "feature"),
    ("Webhooks would be great to have", "feature"),
    ("I would like API key management", "feature"),
];

pub fn add_samples(samples_dir: &Path, pairs: &[(&str, &str)]) {
    for (i, (input, output)) in pairs.iter().enumerate() {
        samples::save_example(samples_dir, &format!("{:03}", i + 1), input, output)
            .expect("save sample");
    }
}
