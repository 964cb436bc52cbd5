//! Example store: `<id>.input.<ext>` / `<id>.output.<ext>` pairs under
//! `samples/`.
//!
//! Ids are zero-padded, monotonically increasing, and never reused while the
//! store is untouched. An input file without a matching output file is
//! skipped.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One authored (input, output) training pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub id: String,
    pub input: String,
    pub output: String,
}

#[derive(Debug, Error)]
pub enum SampleStoreError {
    #[error("Failed to read samples directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read sample file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write sample file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

static INPUT_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?<id>[^.]+)\.input\.(?<ext>[A-Za-z0-9]+)$").expect("valid regex"));

/// Load all complete example pairs, sorted by input filename.
///
/// A missing samples directory yields an empty list.
pub fn load_examples(samples_dir: &Path) -> Result<Vec<Example>, SampleStoreError> {
    if !samples_dir.is_dir() {
        return Ok(Vec::new());
    }
    let names = list_file_names(samples_dir)?;
    let mut input_files: Vec<(String, String)> = names
        .iter()
        .filter_map(|name| {
            INPUT_FILE
                .captures(name)
                .map(|caps| (caps["id"].to_string(), name.clone()))
        })
        .collect();
    input_files.sort_by(|a, b| a.1.cmp(&b.1));

    let mut examples = Vec::with_capacity(input_files.len());
    for (id, input_name) in input_files {
        let output_prefix = format!("{id}.output.");
        let Some(output_name) = names.iter().find(|name| name.starts_with(&output_prefix)) else {
            continue;
        };
        let input = read_trimmed(&samples_dir.join(&input_name))?;
        let output = read_trimmed(&samples_dir.join(output_name))?;
        examples.push(Example { id, input, output });
    }
    Ok(examples)
}

/// Next zero-padded id after the highest numeric id currently present.
pub fn next_example_id(samples_dir: &Path) -> Result<String, SampleStoreError> {
    if !samples_dir.is_dir() {
        return Ok("001".to_string());
    }
    let max = list_file_names(samples_dir)?
        .iter()
        .filter_map(|name| INPUT_FILE.captures(name))
        .filter_map(|caps| caps["id"].parse::<u64>().ok())
        .max();
    Ok(match max {
        Some(max) => format!("{:03}", max + 1),
        None => "001".to_string(),
    })
}

/// Write one example pair under the given id.
pub fn save_example(
    samples_dir: &Path,
    id: &str,
    input: &str,
    output: &str,
) -> Result<(), SampleStoreError> {
    std::fs::create_dir_all(samples_dir).map_err(|source| SampleStoreError::WriteFile {
        path: samples_dir.to_path_buf(),
        source,
    })?;
    for (name, contents) in [
        (format!("{id}.input.txt"), input),
        (format!("{id}.output.txt"), output),
    ] {
        let path = samples_dir.join(name);
        std::fs::write(&path, contents)
            .map_err(|source| SampleStoreError::WriteFile { path, source })?;
    }
    Ok(())
}

/// Distinct outputs across the examples, sorted lexicographically.
///
/// For classify tasks this is the category list that fixes the label↔index
/// mapping.
pub fn unique_output_categories(examples: &[Example]) -> Vec<String> {
    let mut set = std::collections::BTreeSet::new();
    for example in examples {
        set.insert(example.output.clone());
    }
    set.into_iter().collect()
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, SampleStoreError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SampleStoreError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SampleStoreError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(names)
}

fn read_trimmed(path: &Path) -> Result<String, SampleStoreError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SampleStoreError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_dir_yields_empty_list() {
        let dir = tempdir().unwrap();
        let samples = load_examples(&dir.path().join("samples")).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn loads_pairs_and_skips_orphaned_inputs() {
        let dir = tempdir().unwrap();
        save_example(dir.path(), "001", "first", "a").unwrap();
        std::fs::write(dir.path().join("002.input.txt"), "orphan").unwrap();

        let samples = load_examples(dir.path()).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].id, "001");
        assert_eq!(samples[0].input, "first");
        assert_eq!(samples[0].output, "a");
    }

    #[test]
    fn preserves_non_sequential_ids_in_order() {
        let dir = tempdir().unwrap();
        save_example(dir.path(), "010", "third", "c").unwrap();
        save_example(dir.path(), "001", "first", "a").unwrap();
        save_example(dir.path(), "005", "second", "b").unwrap();

        let ids: Vec<String> = load_examples(dir.path())
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["001", "005", "010"]);
    }

    #[test]
    fn next_id_follows_highest_existing() {
        let dir = tempdir().unwrap();
        assert_eq!(next_example_id(dir.path()).unwrap(), "001");
        save_example(dir.path(), "001", "a", "x").unwrap();
        save_example(dir.path(), "005", "b", "y").unwrap();
        assert_eq!(next_example_id(dir.path()).unwrap(), "006");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let dir = tempdir().unwrap();
        save_example(dir.path(), "001", "  padded  ", "label\n").unwrap();
        let samples = load_examples(dir.path()).unwrap();
        assert_eq!(samples[0].input, "padded");
        assert_eq!(samples[0].output, "label");
    }

    #[test]
    fn handles_unicode_text() {
        let dir = tempdir().unwrap();
        save_example(dir.path(), "001", "これは日本語のテキストです", "japanese").unwrap();
        let samples = load_examples(dir.path()).unwrap();
        assert!(samples[0].input.contains("日本語"));
    }

    #[test]
    fn categories_are_sorted_and_distinct() {
        let examples = vec![
            Example {
                id: "001".into(),
                input: "a".into(),
                output: "positive".into(),
            },
            Example {
                id: "002".into(),
                input: "b".into(),
                output: "negative".into(),
            },
            Example {
                id: "003".into(),
                input: "c".into(),
                output: "positive".into(),
            },
        ];
        assert_eq!(unique_output_categories(&examples), ["negative", "positive"]);
    }
}
