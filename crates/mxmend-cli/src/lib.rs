//! mxmend CLI library
//!
//! This module contains the core CLI logic for the mxmend diagram tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{fs, path::Path};

use log::{info, warn};

use mxmend::{MxmendError, Pipeline, document::Document, merge::MergeSource};

/// Run the mxmend CLI application
///
/// This function loads the configuration and runs the pipeline stage
/// selected by the subcommand.
///
/// # Errors
///
/// Returns `MxmendError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Input without a document or a view plan
/// - Malformed documents
/// - Spatial violations
/// - Rejected merges
pub fn run(args: &Args) -> Result<(), MxmendError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let pipeline = Pipeline::new(app_config);

    match &args.command {
        Command::Repair {
            input,
            output,
            resolve,
        } => {
            info!(input_path = input, resolve = *resolve; "Repairing document");
            let document = pipeline.process(&fs::read_to_string(input)?)?;
            warn_if_empty(&document);
            let document = if *resolve {
                pipeline.resolve(&document).document
            } else {
                document
            };
            write_output(output.as_deref(), &document.to_string())
        }
        Command::Validate { input, all } => {
            info!(input_path = input; "Validating document");
            let document = pipeline.process(&fs::read_to_string(input)?)?;
            if !*all {
                pipeline.validate(&document)?;
                println!("{input}: ok");
                return Ok(());
            }

            let report = pipeline.report(&document);
            for violation in report.violations() {
                println!("{input}: {violation}");
            }
            match report.violations().next() {
                Some(first) => Err(MxmendError::SpatialViolation(first.clone())),
                None => {
                    println!("{input}: ok");
                    Ok(())
                }
            }
        }
        Command::Resolve { input, output } => {
            info!(input_path = input; "Resolving overlaps");
            let document = pipeline.process(&fs::read_to_string(input)?)?;
            let resolved = pipeline.resolve(&document);
            for step in &resolved.moves {
                info!(id = step.id.as_str(), from = step.from_y, to = step.to_y; "Moved node");
            }
            write_output(output.as_deref(), &resolved.document.to_string())
        }
        Command::Merge {
            inputs,
            output,
            pages,
        } => {
            info!(inputs = inputs.len(), pages = *pages; "Merging documents");
            let sources = inputs
                .iter()
                .map(|input| read_source(Path::new(input)))
                .collect::<Result<Vec<_>, _>>()?;
            let merged = if *pages {
                pipeline.paginate(&sources)?.to_string()
            } else {
                pipeline.merge(&sources)?.to_string()
            };
            write_output(output.as_deref(), &merged)
        }
        Command::Plan { input } => {
            info!(input_path = input; "Reading view plan");
            let plan = pipeline.plan(&fs::read_to_string(input)?)?;
            println!("story {}", plan.story_id());
            for view in plan.views() {
                println!(
                    "  {} ({}): {}",
                    view.name(),
                    view.kind(),
                    view.components().join(", ")
                );
            }
            if let Some(reasoning) = plan.reasoning() {
                println!("reasoning: {reasoning}");
            }
            Ok(())
        }
    }
}

/// Reads a merge source named after the file stem.
fn read_source(path: &Path) -> Result<MergeSource, MxmendError> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(MergeSource::from_reader(name, fs::File::open(path)?)?)
}

fn write_output(output: Option<&str>, content: &str) -> Result<(), MxmendError> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            info!(output_file = path; "Document written");
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn warn_if_empty(document: &Document) {
    if document.renderable_nodes().is_empty() {
        warn!("Document has no renderable nodes");
    }
}
