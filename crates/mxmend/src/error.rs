//! Error types for mxmend operations.
//!
//! This module provides the main error type [`MxmendError`] which wraps
//! the failures of every pipeline stage.

use std::io;

use thiserror::Error;

use mxmend_parser::error::ParseError;

use crate::{merge::MergeError, validate::Violation};

/// The main error type for mxmend operations.
///
/// # Diagnostic Variants
///
/// `MalformedDocument` carries the text that failed to parse next to the
/// structured diagnostics, so that reports can show source snippets.
#[derive(Debug, Error)]
pub enum MxmendError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no document found in the input")]
    ExtractionEmpty,

    #[error("{err}")]
    MalformedDocument { err: ParseError, src: String },

    #[error("spatial violation: {0}")]
    SpatialViolation(#[from] Violation),

    #[error("merge rejected: {0}")]
    MergeRejected(#[from] MergeError),

    #[error("invalid view plan: {0}")]
    Plan(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl MxmendError {
    /// Create a new `MalformedDocument` error with the text that was parsed.
    pub fn new_malformed_document(err: ParseError, src: impl Into<String>) -> Self {
        Self::MalformedDocument {
            err,
            src: src.into(),
        }
    }
}
