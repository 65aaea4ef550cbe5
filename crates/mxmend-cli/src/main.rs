//! mxmend CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use mxmend::MxmendError;
use mxmend_cli::{Args, error_adapter::to_reportables};

fn main() {
    // Panics inside a pipeline stage get the same report style as errors
    miette::set_panic_hook();

    let args = Args::parse();
    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"); "Starting mxmend");
    debug!(args:?; "Parsed arguments");

    match mxmend_cli::run(&args) {
        Ok(()) => info!("Completed successfully"),
        Err(err) => {
            report(&err);
            process::exit(1);
        }
    }
}

/// Sets up `env_logger`, falling back to `warn` for an unknown level name.
fn init_logging(level: &str) {
    let filter = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Unknown log level `{level}`, falling back to 'warn'");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(filter)
        .init();
    debug!(filter:?; "Logger initialized");
}

/// Renders every diagnostic carried by `err` as its own report.
fn report(err: &MxmendError) {
    let handler = miette::GraphicalReportHandler::new();

    for reportable in to_reportables(err) {
        let mut rendered = String::new();
        // Rendering into a String cannot fail
        handler
            .render_report(&mut rendered, &reportable)
            .expect("rendering into a String");

        error!("{rendered}");
    }
}
