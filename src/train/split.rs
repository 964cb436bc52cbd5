//! Deterministic stratified train/validation splitting.
//!
//! The split depends only on the ordered label sequence: the shuffle seed is
//! derived from a hash of the labels, so repeated runs over the same data
//! produce the identical split regardless of embedding values.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};

/// Train/validation index sets over the input sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Validation fraction: 0.10 below 30 samples to keep training data, 0.20
/// otherwise.
pub fn validation_fraction(total: usize) -> f32 {
    if total < 30 { 0.1 } else { 0.2 }
}

/// Seed derived from the full ordered label sequence.
pub(crate) fn split_seed(labels: &[String]) -> u64 {
    let joined = labels.join("|");
    let hash = blake3::hash(joined.as_bytes());
    u64::from_le_bytes(hash.as_bytes()[0..8].try_into().expect("slice size"))
}

/// Partition indices into train/validation sets, preserving per-class
/// proportions.
///
/// Every class keeps at least one training example: a singleton class
/// contributes its only index to train and none to validation. Classes with
/// at least two examples contribute `max(1, floor(size * fraction))`
/// validation indices, capped at `size - 1`.
pub fn stratified_split(labels: &[String]) -> Split {
    let fraction = validation_fraction(labels.len());
    let mut rng = StdRng::seed_from_u64(split_seed(labels));

    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        by_class.entry(label.as_str()).or_default().push(index);
    }

    let mut train = Vec::new();
    let mut validation = Vec::new();
    for (label, mut indices) in by_class {
        if indices.len() < 3 {
            tracing::warn!(
                "Category \"{label}\" has only {} example(s). Consider adding at least 3 examples per category.",
                indices.len()
            );
        }
        if indices.len() == 1 {
            train.push(indices[0]);
            continue;
        }
        indices.shuffle(&mut rng);
        let for_validation = ((indices.len() as f32 * fraction).floor() as usize)
            .max(1)
            .min(indices.len() - 1);
        validation.extend_from_slice(&indices[..for_validation]);
        train.extend_from_slice(&indices[for_validation..]);
    }

    Split { train, validation }
}
