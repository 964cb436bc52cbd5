//! `exemplar init`: scaffold a new project directory.

use std::path::PathBuf;

use crate::project::{self, ProjectConfig, ProjectError, TaskKind};
use crate::store::now_rfc3339;

use super::CliError;

pub fn run(args: &[String]) -> Result<(), CliError> {
    let options = parse_args(args)?;
    let root = PathBuf::from(&options.name);
    std::fs::create_dir_all(&root).map_err(|source| {
        CliError::Project(ProjectError::Write {
            path: root.clone(),
            source,
        })
    })?;

    let config = ProjectConfig {
        name: options.name.clone(),
        task: options.task,
        description: String::new(),
        created_at: now_rfc3339(),
        version: "1".to_string(),
        embedding_endpoint: None,
    };
    let project = project::init_project(&root, &config)?;

    println!("Created project \"{}\" ({})", options.name, options.task);
    println!("  {}", project.root().join(project::CONFIG_FILE_NAME).display());
    println!("Next: add examples with \"exemplar add\", then run \"exemplar train\".");
    Ok(())
}

struct InitOptions {
    name: String,
    task: TaskKind,
}

fn parse_args(args: &[String]) -> Result<InitOptions, CliError> {
    let mut name: Option<String> = None;
    let mut task = TaskKind::Classify;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--task" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| CliError::Usage("--task requires a value".to_string()))?;
                task = TaskKind::parse(value).ok_or_else(|| {
                    CliError::Usage(format!(
                        "Invalid --task value: {value} (expected classify, extract, or transform)"
                    ))
                })?;
            }
            flag if flag.starts_with("--") => {
                return Err(CliError::Usage(format!("Unknown option: {flag}")));
            }
            positional => {
                if name.is_some() {
                    return Err(CliError::Usage(
                        "init takes exactly one project name".to_string(),
                    ));
                }
                name = Some(positional.to_string());
            }
        }
        idx += 1;
    }

    let name = name.ok_or_else(|| CliError::Usage("Usage: exemplar init <name> [--task classify|extract|transform]".to_string()))?;
    Ok(InitOptions { name, task })
}
