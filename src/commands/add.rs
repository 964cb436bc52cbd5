//! `exemplar add`: append examples to the project.
//!
//! Accepts inline text, a file pair, or a bulk directory of
//! `<id>.input.<ext>` / `<id>.output.<ext>` pairs. Ids are assigned from
//! the next free zero-padded id; imported ids are not preserved.

use std::path::{Path, PathBuf};

use crate::project::Project;
use crate::store::samples;

use super::CliError;

pub fn run(args: &[String]) -> Result<(), CliError> {
    let options = parse_args(args)?;
    let project = Project::discover_from_cwd()?;
    let samples_dir = project.samples_dir();

    match options {
        AddOptions::Inline { input, output } => {
            let id = samples::next_example_id(&samples_dir)?;
            samples::save_example(&samples_dir, &id, &input, &output)?;
            println!("Added example {id}.");
        }
        AddOptions::Files { input, output } => {
            let input_text = read_file(&input)?;
            let output_text = read_file(&output)?;
            let id = samples::next_example_id(&samples_dir)?;
            samples::save_example(&samples_dir, &id, &input_text, &output_text)?;
            println!("Added example {id}.");
        }
        AddOptions::Bulk { dir } => {
            let imported = samples::load_examples(&dir)?;
            if imported.is_empty() {
                return Err(CliError::Usage(format!(
                    "No <id>.input/<id>.output pairs found in {}",
                    dir.display()
                )));
            }
            let mut next: u64 = samples::next_example_id(&samples_dir)?
                .parse()
                .unwrap_or(1);
            for example in &imported {
                samples::save_example(
                    &samples_dir,
                    &format!("{next:03}"),
                    &example.input,
                    &example.output,
                )?;
                next += 1;
            }
            println!("Imported {} example(s).", imported.len());
        }
    }
    Ok(())
}

enum AddOptions {
    Inline { input: String, output: String },
    Files { input: PathBuf, output: PathBuf },
    Bulk { dir: PathBuf },
}

fn parse_args(args: &[String]) -> Result<AddOptions, CliError> {
    let mut input_text: Option<String> = None;
    let mut output_text: Option<String> = None;
    let mut input_file: Option<PathBuf> = None;
    let mut output_file: Option<PathBuf> = None;
    let mut bulk: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        let take_value = |name: &str, idx: &mut usize| -> Result<String, CliError> {
            *idx += 1;
            args.get(*idx)
                .cloned()
                .ok_or_else(|| CliError::Usage(format!("{name} requires a value")))
        };
        match flag {
            "--input" => input_text = Some(take_value("--input", &mut idx)?),
            "--output" => output_text = Some(take_value("--output", &mut idx)?),
            "--input-file" => input_file = Some(PathBuf::from(take_value("--input-file", &mut idx)?)),
            "--output-file" => {
                output_file = Some(PathBuf::from(take_value("--output-file", &mut idx)?))
            }
            "--bulk" => bulk = Some(PathBuf::from(take_value("--bulk", &mut idx)?)),
            unknown => return Err(CliError::Usage(format!("Unknown option: {unknown}"))),
        }
        idx += 1;
    }

    match (input_text, output_text, input_file, output_file, bulk) {
        (Some(input), Some(output), None, None, None) => Ok(AddOptions::Inline { input, output }),
        (None, None, Some(input), Some(output), None) => Ok(AddOptions::Files { input, output }),
        (None, None, None, None, Some(dir)) => Ok(AddOptions::Bulk { dir }),
        _ => Err(CliError::Usage(
            "Usage: exemplar add --input <text> --output <text> | --input-file <path> --output-file <path> | --bulk <dir>"
                .to_string(),
        )),
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map(|raw| raw.trim().to_string())
        .map_err(|source| CliError::ReadInput {
            path: path.to_path_buf(),
            source,
        })
}
