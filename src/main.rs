//! Entry point for the exemplar CLI.

use exemplar::commands::{self, CliError};
use exemplar::logging;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        return Err(CliError::Usage(help_text()));
    };
    match command.as_str() {
        "init" => commands::init::run(&args[1..]),
        "add" => commands::add::run(&args[1..]),
        "train" => commands::train::run(),
        "predict" => commands::predict::run(&args[1..]),
        "review" => commands::review::run(&args[1..]),
        "retrain" => commands::retrain::run(),
        "stats" => commands::stats::run(),
        "export" => commands::export::run(&args[1..]),
        "doctor" => commands::doctor::run(),
        "-h" | "--help" | "help" => {
            println!("{}", help_text());
            Ok(())
        }
        unknown => Err(CliError::Usage(format!(
            "Unknown command: {unknown}\n\n{}",
            help_text()
        ))),
    }
}

fn help_text() -> String {
    [
        "exemplar",
        "",
        "Turns (input, output) example pairs into a trained predictor.",
        "",
        "Usage:",
        "  exemplar <command> [options]",
        "",
        "Commands:",
        "  init <name> [--task classify|extract|transform]   Create a new project",
        "  add [--input <text> --output <text>]              Add one example",
        "      [--input-file <path> --output-file <path>]",
        "      [--bulk <dir>]                                Import <id>.input/<id>.output pairs",
        "  train                                             Train a model on the examples",
        "  predict <text-or-file>                            Predict the output for one input",
        "  review pending|list|approve <id>|reject <id> [--correction <text>]",
        "  retrain                                           Merge reviewed feedback and retrain",
        "  stats                                             Show project status",
        "  export <dir>                                      Copy the trained model elsewhere",
        "  doctor                                            Check the environment",
    ]
    .join("\n")
}
