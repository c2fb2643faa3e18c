//! Compile a FIQL filter to a store query

use super::CliError;
use crate::{CompileOptions, StoreQuery};

/// Options for the compile command
#[derive(Debug, Clone, Default)]
pub struct CompileQueryOptions {
    pub filter: String,
    pub prefix: Option<String>,
}

/// Returns the native store filter.
pub fn execute_compile(options: &CompileQueryOptions) -> Result<serde_json::Value, CliError> {
    let compile = CompileOptions {
        prefix: options.prefix.clone(),
        ..CompileOptions::default()
    };
    Ok(StoreQuery::compile_with(&options.filter, &compile)?.filter())
}
