//! Labelstate: the annotation state engine.
//!
//! Labelstate is the object graph behind a rich-annotation editor: it
//! keeps one annotation's regions, relations and normalizations
//! consistent across edits, supports full snapshot-based undo/redo, and
//! round-trips the whole state through a portable wire format shared with
//! a backend and with model predictions. Rendering, audio decoding and
//! tag-tree parsing live in the hosting editor, not here.
//!
//! # Modules
//!
//! - [`engine`]: The core state engine (Annotation, stores, History)
//! - [`validation`]: Wire result validation and error reporting
//! - [`error`]: Error types for labelstate operations

pub mod engine;
pub mod error;
pub mod validation;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use engine::results::{read_results, WireEntry};
pub use error::LabelstateError;

/// The labelstate CLI application.
#[derive(Parser)]
#[command(name = "labelstate")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a wire result file for errors and warnings.
    Validate(ValidateArgs),

    /// Summarize the contents of a wire result file.
    Inspect(InspectArgs),
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Input file to validate.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Input file to summarize.
    input: PathBuf,
}

/// Run the labelstate CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelstateError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => {
            // No subcommand: just print help hint and exit successfully
            println!("labelstate {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("The annotation state engine.");
            println!();
            println!("Run 'labelstate --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), LabelstateError> {
    let entries = read_results(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_results(&entries, &opts);

    // Output results
    match args.output.as_str() {
        "json" => {
            // Simple JSON output for programmatic use
            println!("{{");
            println!("  \"error_count\": {},", report.error_count());
            println!("  \"warning_count\": {},", report.warning_count());
            println!("  \"issues\": [");
            for (i, issue) in report.issues.iter().enumerate() {
                let comma = if i < report.issues.len() - 1 { "," } else { "" };
                println!("    {{");
                println!("      \"severity\": \"{:?}\",", issue.severity);
                println!("      \"code\": \"{:?}\",", issue.code);
                println!(
                    "      \"message\": \"{}\",",
                    issue.message.replace('"', "\\\"")
                );
                println!("      \"context\": \"{}\"", issue.context);
                println!("    }}{}", comma);
            }
            println!("  ]");
            println!("}}");
        }
        _ => {
            // Default text output
            print!("{}", report);
        }
    }

    // Determine exit status
    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(LabelstateError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), LabelstateError> {
    let entries = read_results(&args.input)?;

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    let mut labels: BTreeMap<&str, usize> = BTreeMap::new();
    let mut regions = 0usize;
    let mut relations = 0usize;

    for entry in &entries {
        match entry {
            WireEntry::Relation(_) => {
                relations += 1;
                *by_type.entry("relation").or_default() += 1;
            }
            WireEntry::Result(result) => {
                *by_type.entry(result.result_type.as_str()).or_default() += 1;
                if engine::RegionShape::is_region_type(&result.result_type) {
                    regions += 1;
                }
                if let Some(list) = result.value.get("labels").and_then(|v| v.as_array()) {
                    for label in list.iter().filter_map(|v| v.as_str()) {
                        *labels.entry(label).or_default() += 1;
                    }
                }
            }
        }
    }

    println!("Entries:   {}", entries.len());
    println!("Regions:   {}", regions);
    println!("Relations: {}", relations);
    println!();
    println!("By type:");
    for (result_type, count) in &by_type {
        println!("  {:<18} {}", result_type, count);
    }
    if !labels.is_empty() {
        println!();
        println!("Labels:");
        for (label, count) in &labels {
            println!("  {:<18} {}", label, count);
        }
    }

    Ok(())
}
