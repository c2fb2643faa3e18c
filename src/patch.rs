//! Structural patches applied to documents by path.
//!
//! A patch is an ordered list of `add`, `remove`, `replace`, `copy`, `move`
//! and `test` operations. [`apply_patch`] runs the whole list against a
//! scratch copy of the document and hands the copy back only when every
//! operation succeeded, so the caller's document is never half-patched.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    convert::json_to_value,
    document::{Container, Document, DocumentError},
    path::{Path, PathSegment},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Add,
    Remove,
    Replace,
    Copy,
    Move,
    Test,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::Replace => "replace",
            OpKind::Copy => "copy",
            OpKind::Move => "move",
            OpKind::Test => "test",
        })
    }
}

#[derive(Debug, Error)]
pub enum PatchError {
    /// `path`, `value` or `from` absent where the operation needs it
    #[error("operation {index} ({op}) is missing '{field}'")]
    MissingField {
        index: usize,
        op: OpKind,
        field: &'static str,
    },

    #[error("operation {index} ({op}) failed: {source}")]
    Operation {
        index: usize,
        op: OpKind,
        #[source]
        source: DocumentError,
    },

    #[error("invalid patch JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PatchError {
    /// Missing paths, out-of-range indices and missing operation fields.
    pub fn is_path_error(&self) -> bool {
        match self {
            PatchError::MissingField { .. } => true,
            PatchError::Operation { source, .. } => source.is_path_error(),
            PatchError::Json(_) => false,
        }
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, PatchError::Operation { source, .. } if source.is_type_error())
    }

    /// Position of the failing operation in the batch.
    pub fn index(&self) -> Option<usize> {
        match self {
            PatchError::MissingField { index, .. } | PatchError::Operation { index, .. } => {
                Some(*index)
            }
            PatchError::Json(_) => None,
        }
    }
}

/// One edit. `path` and `from` are dot-paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: OpKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// `Some(Value::Null)` for an explicit JSON `null`, `None` when absent
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl PatchOperation {
    pub fn new(op: OpKind, path: impl Into<String>) -> Self {
        PatchOperation {
            op,
            path: Some(path.into()),
            from: None,
            value: None,
        }
    }

    pub fn add(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(OpKind::Add, path).with_value(value)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::new(OpKind::Remove, path)
    }

    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(OpKind::Replace, path).with_value(value)
    }

    pub fn copy(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(OpKind::Copy, path).with_from(from)
    }

    pub fn move_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(OpKind::Move, path).with_from(from)
    }

    pub fn test(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(OpKind::Test, path).with_value(value)
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}

/// Result of a batch that raised no error.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOutcome {
    /// Every operation applied; the patched copy
    Applied(Document),
    /// The `test` at `index` did not hold; nothing was applied
    TestFailed { index: usize },
}

impl PatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PatchOutcome::Applied(_))
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            PatchOutcome::Applied(doc) => Some(doc),
            PatchOutcome::TestFailed { .. } => None,
        }
    }
}

/// An ordered list of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    operations: Vec<PatchOperation>,
}

impl Patch {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Patch { operations }
    }

    /// Read a JSON array of operations. Paths may be `/`-delimited pointers
    /// (`/a/b/-`) or dot-paths.
    pub fn from_json(input: &str) -> Result<Patch, PatchError> {
        let mut operations: Vec<PatchOperation> = serde_json::from_str(input)?;
        for operation in &mut operations {
            for path in [&mut operation.path, &mut operation.from].into_iter().flatten() {
                *path = to_dot_path(path);
            }
        }
        Ok(Patch { operations })
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn apply(&self, document: &Document) -> Result<PatchOutcome, PatchError> {
        apply_patch(document, &self.operations)
    }
}

impl From<Vec<PatchOperation>> for Patch {
    fn from(operations: Vec<PatchOperation>) -> Self {
        Patch::new(operations)
    }
}

fn to_dot_path(path: &str) -> String {
    if path.starts_with('/') {
        Path::from_pointer(path).to_string()
    } else {
        path.to_string()
    }
}

/// Apply `operations` in order to a copy of `document`.
///
/// Returns the patched copy, or the index of the first `test` that did not
/// hold. Any other failure is an error. In both cases `document` is left as
/// it was.
pub fn apply_patch(
    document: &Document,
    operations: &[PatchOperation],
) -> Result<PatchOutcome, PatchError> {
    let mut scratch = document.clone();

    for (index, operation) in operations.iter().enumerate() {
        let path = operation.path.as_deref().unwrap_or_default();
        trace!(index, op = %operation.op, path, "applying patch operation");

        if !apply_operation(&mut scratch, index, operation)? {
            warn!(index, path, "patch test failed, batch not applied");
            return Ok(PatchOutcome::TestFailed { index });
        }
    }

    debug!(operations = operations.len(), "applied patch");
    Ok(PatchOutcome::Applied(scratch))
}

/// Apply one operation; `Ok(false)` only for a failed `test`.
fn apply_operation(
    doc: &mut Document,
    index: usize,
    operation: &PatchOperation,
) -> Result<bool, PatchError> {
    let op = operation.op;
    let missing = |field| PatchError::MissingField { index, op, field };
    let failed = |source| PatchError::Operation { index, op, source };

    let path = operation
        .path
        .as_deref()
        .map(Path::parse)
        .ok_or_else(|| missing("path"))?;
    let value = || {
        operation
            .value
            .clone()
            .map(expand_structured)
            .ok_or_else(|| missing("value"))
    };
    let from = || {
        operation
            .from
            .as_deref()
            .map(Path::parse)
            .ok_or_else(|| missing("from"))
    };

    match op {
        OpKind::Add => add(doc, &path, value()?).map_err(failed)?,
        OpKind::Remove => {
            remove(doc, &path).map_err(failed)?;
        }
        OpKind::Replace => replace(doc, &path, value()?).map_err(failed)?,
        OpKind::Copy => {
            let from = from()?;
            let captured = read(doc, &from).map_err(failed)?;
            add(doc, &path, captured).map_err(failed)?;
        }
        OpKind::Move => {
            let from = from()?;
            let captured = read(doc, &from).map_err(failed)?;
            ensure_parent(doc, &path).map_err(failed)?;
            remove(doc, &from).map_err(failed)?;
            add(doc, &path, captured).map_err(failed)?;
        }
        OpKind::Test => {
            let expected = value()?;
            return Ok(doc
                .get_path(&path)
                .is_some_and(|actual| actual.same_as(&expected)));
        }
    }
    Ok(true)
}

/// Strings holding a JSON object or array become structured values.
fn expand_structured(value: Value) -> Value {
    match value {
        Value::String(text) if text.trim_start().starts_with(['{', '[']) => {
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(json) => json_to_value(json),
                Err(_) => Value::String(text),
            }
        }
        other => other,
    }
}

fn split(path: &Path) -> Result<(Path, &PathSegment), DocumentError> {
    path.split_leaf().ok_or(DocumentError::EmptyPath)
}

fn read(doc: &Document, path: &Path) -> Result<Value, DocumentError> {
    doc.get_path(path)
        .cloned()
        .ok_or_else(|| DocumentError::PathNotFound {
            path: path.to_string(),
        })
}

fn ensure_parent(doc: &mut Document, path: &Path) -> Result<(), DocumentError> {
    let (parent, _) = split(path)?;
    doc.container(&parent, false).map(|_| ())
}

fn add(doc: &mut Document, path: &Path, value: Value) -> Result<(), DocumentError> {
    let (parent, leaf) = split(path)?;

    match (doc.container(&parent, false)?, leaf) {
        (Container::List(items), PathSegment::End) => items.push(value),
        (Container::List(items), PathSegment::Index(i)) => {
            if *i > items.len() {
                return Err(DocumentError::IndexOutOfBounds {
                    path: path.to_string(),
                    len: items.len(),
                });
            }
            items.insert(*i, value);
        }
        (Container::List(_), PathSegment::Field(_)) => {
            return Err(DocumentError::NotADocument {
                path: parent.to_string(),
                found: "list",
            });
        }
        (Container::Document(_), PathSegment::Index(_) | PathSegment::End) => {
            return Err(DocumentError::NotAList {
                path: parent.to_string(),
                found: "document",
            });
        }
        (Container::Document(target), PathSegment::Field(key)) => {
            target.insert(key.clone(), value);
        }
    }
    Ok(())
}

/// Position of an existing element, `-` meaning the last one.
fn existing_index(
    items: &[Value],
    leaf: &PathSegment,
    path: &Path,
) -> Result<usize, DocumentError> {
    leaf.position(items.len())
        .ok_or_else(|| DocumentError::IndexOutOfBounds {
            path: path.to_string(),
            len: items.len(),
        })
}

fn remove(doc: &mut Document, path: &Path) -> Result<Value, DocumentError> {
    let (parent, leaf) = split(path)?;
    let not_found = || DocumentError::PathNotFound {
        path: path.to_string(),
    };

    match (doc.container(&parent, false)?, leaf) {
        (Container::List(_), PathSegment::Field(_)) => Err(DocumentError::NotADocument {
            path: parent.to_string(),
            found: "list",
        }),
        (Container::List(items), leaf) => {
            let i = existing_index(items, leaf, path)?;
            Ok(items.remove(i))
        }
        (Container::Document(_), PathSegment::Index(_) | PathSegment::End) => {
            Err(DocumentError::NotAList {
                path: parent.to_string(),
                found: "document",
            })
        }
        (Container::Document(target), PathSegment::Field(key)) => {
            target.remove_field(key).ok_or_else(not_found)
        }
    }
}

fn replace(doc: &mut Document, path: &Path, value: Value) -> Result<(), DocumentError> {
    let (parent, leaf) = split(path)?;

    match (doc.container(&parent, false)?, leaf) {
        (Container::List(_), PathSegment::Field(_)) => Err(DocumentError::NotADocument {
            path: parent.to_string(),
            found: "list",
        }),
        (Container::List(items), leaf) => {
            let i = existing_index(items, leaf, path)?;
            items[i] = value;
            Ok(())
        }
        (Container::Document(_), PathSegment::Index(_) | PathSegment::End) => {
            Err(DocumentError::NotAList {
                path: parent.to_string(),
                found: "document",
            })
        }
        (Container::Document(target), PathSegment::Field(key)) => {
            if target.get_field(key).is_none() {
                return Err(DocumentError::PathNotFound {
                    path: path.to_string(),
                });
            }
            target.insert(key.clone(), value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_doc() -> Document {
        Document::new().with(
            "list",
            vec![Value::from("a"), Value::from("b")],
        )
    }

    fn applied(outcome: PatchOutcome) -> Document {
        outcome.into_document().expect("patch applied")
    }

    #[test]
    fn add_inserts_at_index() {
        let doc = applied(apply_patch(&list_doc(), &[PatchOperation::add("list.1", "x")]).unwrap());
        assert_eq!(
            doc.get("list"),
            Some(&Value::List(vec!["a".into(), "x".into(), "b".into()]))
        );
    }

    #[test]
    fn add_index_past_end_fails() {
        let err = apply_patch(&list_doc(), &[PatchOperation::add("list.3", "x")]).unwrap_err();
        assert!(err.is_path_error());
    }

    #[test]
    fn positional_leaf_on_document_is_type_error() {
        let doc = Document::new().with("meta", Document::new());
        let err = apply_patch(&doc, &[PatchOperation::add("meta.-", 1)]).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn missing_value_is_reported() {
        let err = apply_patch(&list_doc(), &[PatchOperation::new(OpKind::Replace, "list.0")])
            .unwrap_err();
        assert!(matches!(
            err,
            PatchError::MissingField { index: 0, op: OpKind::Replace, field: "value" }
        ));
    }

    #[test]
    fn structured_string_values_are_expanded() {
        let doc = applied(
            apply_patch(&Document::new(), &[PatchOperation::add("meta", r#"{"a":[1,2]}"#)]).unwrap(),
        );
        assert_eq!(doc.get("meta.a.1"), Some(&Value::Integer(2)));
    }

    #[test]
    fn explicit_null_value_is_kept() {
        let patch = Patch::from_json(r#"[{"op":"add","path":"/owner","value":null}]"#).unwrap();
        assert_eq!(patch.operations()[0].value, Some(Value::Null));

        let patch = Patch::from_json(r#"[{"op":"remove","path":"/owner"}]"#).unwrap();
        assert_eq!(patch.operations()[0].value, None);
    }
}
