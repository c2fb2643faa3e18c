//! Evaluate a FIQL filter against a JSON document

use super::{CliError, read_document};
use crate::{CompileOptions, Criteria, parse_fiql_with};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The FIQL filter to evaluate
    pub filter: String,
    /// Scope every selector under this path
    pub prefix: Option<String>,
    /// JSON document
    pub input: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

impl CheckOptions {
    fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            prefix: self.prefix.clone(),
            ..CompileOptions::default()
        }
    }
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// The filter parsed; its normalized FIQL form
    SyntaxValid(String),
    /// Whether the document meets the filter
    Evaluated(bool),
}

pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    if options.syntax_only {
        let node = parse_fiql_with(&options.filter, &options.compile_options())?;
        return Ok(CheckResult::SyntaxValid(node.to_string()));
    }

    let criteria = Criteria::compile_with(&options.filter, &options.compile_options())?;
    let document = read_document(options.input.as_ref())?;
    Ok(CheckResult::Evaluated(criteria.meets(&document)))
}
