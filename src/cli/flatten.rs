//! Convert between nested documents and flat dot-path maps

use super::{CliError, read_document};
use crate::{Document, convert::value_to_json};

/// Options for the flatten command
#[derive(Debug, Clone, Default)]
pub struct FlattenOptions {
    pub input: Option<String>,
    /// Re-nest a flat map instead of flattening
    pub unflatten: bool,
}

pub fn execute_flatten(options: &FlattenOptions) -> Result<serde_json::Value, CliError> {
    let document = read_document(options.input.as_ref())?;

    if options.unflatten {
        let nested = Document::unflatten(document)?;
        return Ok(nested.into());
    }

    let flat = document
        .flatten()
        .into_iter()
        .map(|(path, value)| (path, value_to_json(value)))
        .collect::<serde_json::Map<_, _>>();
    Ok(serde_json::Value::Object(flat))
}
