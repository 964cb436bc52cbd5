//! Feedback merge engine.
//!
//! Combines authored examples with reviewed predictions into the training
//! set used for a retrain. Authored ground truth is never overwritten: an
//! approved prediction whose input already exists with a different authored
//! output is skipped as a conflict.

use crate::store::review::ReviewItem;
use crate::store::samples::Example;

/// Result of a merge: the training set plus the per-rule counters.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub training_set: Vec<Example>,
    pub added_from_review: usize,
    pub skipped_conflicts: usize,
    pub excluded: usize,
}

/// Build the training set for a retrain from authored examples plus every
/// reviewed item. Unreviewed items contribute nothing.
///
/// Per-item rules:
/// - approved: appended as `(input, predicted_output)` unless an authored
///   example already shares the trimmed input: same output means it is
///   already represented, a different output is a counted conflict;
/// - rejected with a correction: appended as `(input, corrected_output)`
///   unless that exact trimmed pair already exists in the merged set;
/// - rejected without a correction: excluded entirely.
pub fn merge_training_set(originals: &[Example], review_items: &[ReviewItem]) -> MergeOutcome {
    let mut training_set: Vec<Example> = originals.to_vec();
    let mut added_from_review = 0usize;
    let mut skipped_conflicts = 0usize;
    let mut excluded = 0usize;

    for item in review_items.iter().filter(|item| item.is_reviewed()) {
        if item.approved {
            let predicted = item.predicted_output.trim();
            let authored = originals
                .iter()
                .find(|example| example.input.trim() == item.input.trim());
            match authored {
                Some(example) if example.output.trim() != predicted => {
                    tracing::warn!(
                        "Review conflict for input of example {}: authored output \"{}\" kept over approved prediction \"{}\"",
                        example.id,
                        example.output,
                        item.predicted_output
                    );
                    skipped_conflicts += 1;
                }
                Some(_) => {
                    // Already represented by an authored example.
                }
                None => {
                    training_set.push(Example {
                        id: format!("review-{}", item.id),
                        input: item.input.clone(),
                        output: item.predicted_output.clone(),
                    });
                    added_from_review += 1;
                }
            }
        } else if let Some(correction) = &item.corrected_output {
            let exists = training_set.iter().any(|example| {
                example.input.trim() == item.input.trim()
                    && example.output.trim() == correction.trim()
            });
            if !exists {
                training_set.push(Example {
                    id: format!("corrected-{}", item.id),
                    input: item.input.clone(),
                    output: correction.clone(),
                });
                added_from_review += 1;
            }
        } else {
            excluded += 1;
        }
    }

    MergeOutcome {
        training_set,
        added_from_review,
        skipped_conflicts,
        excluded,
    }
}
