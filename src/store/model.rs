//! Model store: atomic JSON persistence for trained models plus their
//! metadata, and best-effort archiving of the previous model.
//!
//! Writes go through a temp file in the target directory followed by a
//! rename, so an interrupted (re)train leaves the previously persisted
//! model untouched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use super::now_rfc3339;

/// Classifier network blob filename.
pub const MODEL_FILE: &str = "model.json";
/// Retrieval model blob filename.
pub const RETRIEVAL_FILE: &str = "retrieval_model.json";
/// Metadata filename shared by both model kinds.
pub const METADATA_FILE: &str = "metadata.json";
/// Subdirectory holding archived models; excluded from archiving itself.
pub const ARCHIVE_DIR: &str = "archive";

#[derive(Debug, Error)]
pub enum ModelStoreError {
    #[error("No trained model found. Run \"exemplar train\" first.")]
    NotTrained,
    #[error("Failed to read model file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Corrupted model file {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode model data: {0}")]
    Encode(serde_json::Error),
    #[error("Failed to write model file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model data in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Metadata for a trained classifier. The sorted `categories` list fixes
/// the label↔index mapping and must be reused verbatim at prediction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierMetadata {
    pub categories: Vec<String>,
    pub trained_at: String,
    pub num_samples: usize,
    pub accuracy: f32,
    pub epochs: usize,
}

/// Metadata for a built retrieval model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMetadata {
    pub task: String,
    pub trained_at: String,
    pub num_samples: usize,
}

/// Tagged metadata persisted as `model/metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelMetadata {
    Classifier(ClassifierMetadata),
    Retrieval(RetrievalMetadata),
}

impl ModelMetadata {
    pub fn trained_at(&self) -> &str {
        match self {
            ModelMetadata::Classifier(meta) => &meta.trained_at,
            ModelMetadata::Retrieval(meta) => &meta.trained_at,
        }
    }

    pub fn num_samples(&self) -> usize {
        match self {
            ModelMetadata::Classifier(meta) => meta.num_samples,
            ModelMetadata::Retrieval(meta) => meta.num_samples,
        }
    }

    /// Headline accuracy: validation accuracy for classifiers, leave-one-out
    /// for retrieval models (recorded by the caller after evaluation).
    pub fn accuracy(&self) -> Option<f32> {
        match self {
            ModelMetadata::Classifier(meta) => Some(meta.accuracy),
            ModelMetadata::Retrieval(_) => None,
        }
    }
}

/// Serialize `value` to `path` atomically (temp file + rename).
pub fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    pretty: bool,
) -> Result<(), ModelStoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| ModelStoreError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut data = if pretty {
        serde_json::to_vec_pretty(value).map_err(ModelStoreError::Encode)?
    } else {
        serde_json::to_vec(value).map_err(ModelStoreError::Encode)?
    };
    if pretty {
        data.push(b'\n');
    }
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(|source| ModelStoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(temp.path(), &data).map_err(|source| ModelStoreError::Write {
        path: temp.path().to_path_buf(),
        source,
    })?;
    temp.persist(path).map_err(|err| ModelStoreError::Write {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}

/// Decode the JSON file at `path`; a missing file is `NotTrained`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelStoreError> {
    if !path.is_file() {
        return Err(ModelStoreError::NotTrained);
    }
    let raw = std::fs::read(path).map_err(|source| ModelStoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| ModelStoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `model/metadata.json`.
pub fn load_metadata(model_dir: &Path) -> Result<ModelMetadata, ModelStoreError> {
    read_json(&model_dir.join(METADATA_FILE))
}

/// Write `model/metadata.json` atomically.
pub fn save_metadata(model_dir: &Path, metadata: &ModelMetadata) -> Result<(), ModelStoreError> {
    write_json_atomic(&model_dir.join(METADATA_FILE), metadata, true)
}

/// Copy the current model files into `model/archive/<timestamp>/`.
///
/// Archiving is best-effort: failures are logged and must not block a
/// retrain from proceeding. Returns the archive directory when anything was
/// copied.
pub fn archive_previous(model_dir: &Path) -> Option<PathBuf> {
    if !model_dir.join(METADATA_FILE).is_file() {
        return None;
    }
    let stamp = now_rfc3339().replace([':', '.'], "-");
    let archive_dir = model_dir.join(ARCHIVE_DIR).join(stamp);
    if let Err(err) = std::fs::create_dir_all(&archive_dir) {
        tracing::warn!("Could not create model archive directory: {err}");
        return None;
    }
    let entries = match std::fs::read_dir(model_dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("Could not enumerate model directory for archiving: {err}");
            return None;
        }
    };
    let mut copied = 0usize;
    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        match std::fs::copy(&path, archive_dir.join(name)) {
            Ok(_) => copied += 1,
            Err(err) => {
                tracing::warn!("Could not archive {}: {err}", path.display());
            }
        }
    }
    (copied > 0).then_some(archive_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn classifier_metadata() -> ModelMetadata {
        ModelMetadata::Classifier(ClassifierMetadata {
            categories: vec!["negative".into(), "positive".into()],
            trained_at: "2026-03-01T12:00:00Z".into(),
            num_samples: 12,
            accuracy: 0.92,
            epochs: 34,
        })
    }

    #[test]
    fn metadata_round_trips_with_kind_tag() {
        let dir = tempdir().unwrap();
        save_metadata(dir.path(), &classifier_metadata()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap();
        assert!(raw.contains("\"kind\": \"classifier\""));

        let loaded = load_metadata(dir.path()).unwrap();
        match loaded {
            ModelMetadata::Classifier(meta) => {
                assert_eq!(meta.categories, ["negative", "positive"]);
                assert_eq!(meta.num_samples, 12);
            }
            ModelMetadata::Retrieval(_) => panic!("wrong metadata kind"),
        }
    }

    #[test]
    fn missing_metadata_is_not_trained() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_metadata(dir.path()),
            Err(ModelStoreError::NotTrained)
        ));
    }

    #[test]
    fn atomic_write_replaces_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE);
        write_json_atomic(&path, &vec![1u32, 2, 3], false).unwrap();
        write_json_atomic(&path, &vec![9u32], false).unwrap();
        let loaded: Vec<u32> = read_json(&path).unwrap();
        assert_eq!(loaded, [9]);
    }

    #[test]
    fn archive_copies_model_files() {
        let dir = tempdir().unwrap();
        save_metadata(dir.path(), &classifier_metadata()).unwrap();
        write_json_atomic(&dir.path().join(MODEL_FILE), &vec![0.5f32], false).unwrap();

        let archive = archive_previous(dir.path()).expect("archive created");
        assert!(archive.join(METADATA_FILE).is_file());
        assert!(archive.join(MODEL_FILE).is_file());
        // Originals stay in place.
        assert!(dir.path().join(METADATA_FILE).is_file());
    }

    #[test]
    fn archive_without_model_is_noop() {
        let dir = tempdir().unwrap();
        assert!(archive_previous(dir.path()).is_none());
    }
}
