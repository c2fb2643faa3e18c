//! Apply a JSON patch to a document

use super::{CliError, read_document};
use crate::{Patch, PatchOutcome};

/// Options for the patch command
#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    /// JSON array of patch operations
    pub patch: String,
    /// JSON document to patch
    pub input: Option<String>,
}

pub fn execute_patch(options: &PatchOptions) -> Result<PatchOutcome, CliError> {
    let patch = Patch::from_json(&options.patch)?;
    let document = read_document(options.input.as_ref())?;
    Ok(patch.apply(&document)?)
}
