//! `exemplar retrain`: fold reviewed feedback into the training set and
//! train a replacement model.
//!
//! The previous model is archived best-effort before the new one is
//! written; an archive failure never blocks the retrain.

use crate::feedback::merge_training_set;
use crate::project::Project;
use crate::store::model::{archive_previous, load_metadata};
use crate::store::review;
use crate::store::samples;
use crate::train::TrainError;

use super::train::train_on_examples;
use super::{CliError, percent, print_table};

pub fn run() -> Result<(), CliError> {
    let project = Project::discover_from_cwd()?;

    let previous_accuracy = load_metadata(&project.model_dir())
        .ok()
        .and_then(|metadata| metadata.accuracy());
    if archive_previous(&project.model_dir()).is_some() {
        println!("Previous model archived.");
    }

    let originals = samples::load_examples(&project.samples_dir())?;
    let snapshot = review::load_snapshot(&project.review_path())?;
    let outcome = merge_training_set(&originals, &snapshot.items);

    println!(
        "Training set: {} original + {} from review",
        originals.len(),
        outcome.added_from_review
    );
    if outcome.excluded > 0 {
        println!(
            "{} rejected item(s) excluded (no correction provided)",
            outcome.excluded
        );
    }
    if outcome.skipped_conflicts > 0 {
        println!(
            "{} approved item(s) skipped: input already has an authored output",
            outcome.skipped_conflicts
        );
    }

    let need = project.config().task.min_samples();
    if outcome.training_set.len() < need {
        return Err(TrainError::InsufficientSamples {
            have: outcome.training_set.len(),
            need,
        }
        .into());
    }

    println!(
        "Retraining {} model \"{}\"",
        project.config().task,
        project.config().name
    );
    let new_accuracy = train_on_examples(&project, &outcome.training_set)?;

    match previous_accuracy {
        Some(previous) => {
            let direction = if new_accuracy > previous {
                "improved"
            } else if new_accuracy < previous {
                "decreased"
            } else {
                "unchanged"
            };
            print_table(&[
                ("Previous accuracy", percent(previous)),
                ("New accuracy", percent(new_accuracy)),
                (
                    "Change",
                    format!("{direction} by {:.1}%", (new_accuracy - previous).abs() * 100.0),
                ),
            ]);
        }
        None => print_table(&[("Accuracy", percent(new_accuracy))]),
    }

    println!("New model saved to model/");
    Ok(())
}
