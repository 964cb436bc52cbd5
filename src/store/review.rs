//! Review store: the full list of reviewed predictions, persisted as one
//! JSON snapshot after every mutation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One prediction awaiting (or holding) a human verdict.
///
/// `reviewed_at` being absent means the item has not been reviewed yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Mirrors the id of the example the prediction was made for.
    pub id: String,
    pub input: String,
    pub predicted_output: String,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
}

impl ReviewItem {
    pub fn is_reviewed(&self) -> bool {
        self.reviewed_at.is_some()
    }
}

/// The full review state for a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    pub items: Vec<ReviewItem>,
}

impl ReviewSnapshot {
    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut ReviewItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Items that have received a verdict.
    pub fn reviewed(&self) -> impl Iterator<Item = &ReviewItem> {
        self.items.iter().filter(|item| item.is_reviewed())
    }
}

#[derive(Debug, Error)]
pub enum ReviewStoreError {
    #[error("Failed to read review snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Corrupted review snapshot {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write review snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode review snapshot: {0}")]
    Encode(serde_json::Error),
}

/// Load the snapshot; a missing file is an empty snapshot.
pub fn load_snapshot(path: &Path) -> Result<ReviewSnapshot, ReviewStoreError> {
    if !path.is_file() {
        return Ok(ReviewSnapshot::default());
    }
    let raw = std::fs::read(path).map_err(|source| ReviewStoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| ReviewStoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist the whole snapshot, creating parent directories as needed.
pub fn save_snapshot(path: &Path, snapshot: &ReviewSnapshot) -> Result<(), ReviewStoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ReviewStoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut data = serde_json::to_vec_pretty(snapshot).map_err(ReviewStoreError::Encode)?;
    data.push(b'\n');
    std::fs::write(path, data).map_err(|source| ReviewStoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pending_item(id: &str) -> ReviewItem {
        ReviewItem {
            id: id.to_string(),
            input: format!("input {id}"),
            predicted_output: "positive".to_string(),
            approved: false,
            corrected_output: None,
            reviewed_at: None,
        }
    }

    #[test]
    fn missing_snapshot_is_empty() {
        let dir = tempdir().unwrap();
        let snapshot = load_snapshot(&dir.path().join("results.json")).unwrap();
        assert!(snapshot.items.is_empty());
    }

    #[test]
    fn round_trips_snapshot_with_optional_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("review").join("results.json");

        let mut snapshot = ReviewSnapshot {
            items: vec![pending_item("001"), pending_item("002")],
        };
        snapshot.items[1].approved = true;
        snapshot.items[1].reviewed_at = Some("2026-02-01T10:00:00Z".to_string());
        save_snapshot(&path, &snapshot).unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert!(!loaded.items[0].is_reviewed());
        assert!(loaded.items[1].is_reviewed());
        assert_eq!(loaded.reviewed().count(), 1);
    }

    #[test]
    fn find_mut_edits_in_place() {
        let mut snapshot = ReviewSnapshot {
            items: vec![pending_item("001")],
        };
        let item = snapshot.find_mut("001").unwrap();
        item.approved = true;
        item.reviewed_at = Some("2026-02-01T10:00:00Z".to_string());
        assert!(snapshot.items[0].is_reviewed());
        assert!(snapshot.find_mut("999").is_none());
    }
}
