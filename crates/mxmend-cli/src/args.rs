//! Command-line argument definitions for the mxmend CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Each stage of the pipeline is exposed as a subcommand;
//! configuration file selection and logging verbosity are global.

use clap::{Parser, Subcommand};

/// Command-line arguments for the mxmend diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract, repair and sanitize a generated document
    Repair {
        /// Path to the generated text
        input: String,

        /// Path to the output file; standard output when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Also push overlapping nodes apart
        #[arg(long)]
        resolve: bool,
    },

    /// Check the spatial rules of a document
    Validate {
        /// Path to the document
        input: String,

        /// Report every violation instead of stopping at the first
        #[arg(long)]
        all: bool,
    },

    /// Push overlapping nodes apart
    Resolve {
        /// Path to the document
        input: String,

        /// Path to the output file; standard output when omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Combine several documents
    Merge {
        /// Paths to the documents, in merge order
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Path to the output file; standard output when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Keep each document on its own page instead of folding them together
        #[arg(long)]
        pages: bool,
    },

    /// Read a view plan from generated text
    Plan {
        /// Path to the generated text
        input: String,
    },
}
