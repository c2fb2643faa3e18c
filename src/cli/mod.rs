//! CLI support for catalog-core
//!
//! Provides programmatic access to the `catalog` commands so they can be
//! embedded in other tools and tested without spawning a process.

mod check;
mod compile;
mod flatten;
mod patch;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use compile::{CompileQueryOptions, execute_compile};
pub use flatten::{FlattenOptions, execute_flatten};
pub use patch::{PatchOptions, execute_patch};

use std::io;

use thiserror::Error;

use crate::{DocumentError, ParseError, PatchError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No `--input` and nothing piped on stdin
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}

/// Parse the JSON document given to a command.
fn read_document(input: Option<&String>) -> Result<crate::Document, CliError> {
    let text = input.ok_or(CliError::NoInput)?;
    Ok(crate::Document::from_json(text)?)
}
