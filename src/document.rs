//! Ordered, nested documents addressed by dot-paths.
//!
//! A [`Document`] is an insertion-ordered mapping from string keys to
//! [`Value`]s. Nested documents and lists are reached with dot-paths such
//! as `geocode.1.value`: numeric segments index into lists, every other
//! segment is a mapping key, and `-` addresses the last list element.
//!
//! Reads are forgiving (an absent segment anywhere yields `None`), writes
//! report why they could not be carried out.
//!
//! ```
//! use catalog_core::{Document, Value};
//!
//! let mut doc = Document::new();
//! doc.set("Doc.title", "Severe weather").unwrap();
//! doc.set("Doc.tags", Value::List(vec!["wx".into()])).unwrap();
//!
//! assert_eq!(doc.get("Doc.title"), Some(&Value::from("Severe weather")));
//! assert_eq!(doc.get("Doc.tags.0"), Some(&Value::from("wx")));
//! assert!(doc.get("Doc.missing.deeper").is_none());
//!
//! let flat = doc.flatten();
//! assert_eq!(flat.keys().collect::<Vec<_>>(), ["Doc.title", "Doc.tags.0"]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    convert,
    path::{Path, PathSegment},
    value::Value,
};

/// Errors raised by document writes and JSON conversion.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The addressed path, or one of its parents, does not exist
    #[error("path '{path}' does not exist")]
    PathNotFound { path: String },

    /// A list index past the end of the list
    #[error("index out of bounds at '{path}' (list length {len})")]
    IndexOutOfBounds { path: String, len: usize },

    /// A positional segment (`3`, `-`) applied to something other than a list
    #[error("expected a list at '{path}', found {found}")]
    NotAList { path: String, found: &'static str },

    /// A key segment applied to something other than a document
    #[error("expected a document at '{path}', found {found}")]
    NotADocument { path: String, found: &'static str },

    /// Descending through a scalar value
    #[error("cannot address into {found} at '{path}'")]
    NotAContainer { path: String, found: &'static str },

    /// The empty path names the document itself, not a value in it
    #[error("an empty path does not address a value")]
    EmptyPath,

    /// JSON input whose top level is not an object
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentError {
    /// Missing paths and out-of-range indices.
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            DocumentError::PathNotFound { .. }
                | DocumentError::IndexOutOfBounds { .. }
                | DocumentError::EmptyPath
        )
    }

    /// Positional access on a non-list, key access on a non-document.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            DocumentError::NotAList { .. }
                | DocumentError::NotADocument { .. }
                | DocumentError::NotAContainer { .. }
        )
    }
}

/// A mutable view of the container a path resolves to.
pub(crate) enum Container<'a> {
    Document(&'a mut Document),
    List(&'a mut Vec<Value>),
}

/// An ordered mapping from key to [`Value`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a top-level key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Insert a top-level key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Look up a top-level key without path interpretation.
    pub fn get_field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a top-level key, keeping the order of the remaining keys.
    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Read the value at a dot-path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_path(&Path::parse(path))
    }

    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.fields.get(&first.as_key())?;
        for segment in rest {
            current = child(current, segment)?;
        }
        Some(current)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        self.get_path_mut(&Path::parse(path))
    }

    pub fn get_path_mut(&mut self, path: &Path) -> Option<&mut Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.fields.get_mut(&first.as_key())?;
        for segment in rest {
            current = child_mut(current, segment)?;
        }
        Some(current)
    }

    pub fn contains_key(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Write `value` at a dot-path.
    ///
    /// Missing intermediate mappings are created. List slots are never
    /// created: an index must already exist (`-` names the last element).
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), DocumentError> {
        self.set_path(&Path::parse(path), value.into())
    }

    pub fn set_path(&mut self, path: &Path, value: Value) -> Result<(), DocumentError> {
        let (parent, leaf) = path.split_leaf().ok_or(DocumentError::EmptyPath)?;
        match self.container(&parent, true)? {
            Container::Document(doc) => {
                doc.fields.insert(leaf.as_key(), value);
                Ok(())
            }
            Container::List(items) => {
                let index = list_position(items, leaf, path, &parent)?;
                items[index] = value;
                Ok(())
            }
        }
    }

    /// Remove the value at a dot-path.
    ///
    /// Removing a path that does not exist is a no-op returning `None`.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.remove_path(&Path::parse(path))
    }

    pub fn remove_path(&mut self, path: &Path) -> Option<Value> {
        let (parent, leaf) = path.split_leaf()?;
        match self.container(&parent, false).ok()? {
            Container::Document(doc) => doc.fields.shift_remove(&leaf.as_key()),
            Container::List(items) => {
                let index = leaf.position(items.len())?;
                Some(items.remove(index))
            }
        }
    }

    /// Resolve `path` to a container, optionally creating missing mappings.
    pub(crate) fn container(
        &mut self,
        path: &Path,
        create: bool,
    ) -> Result<Container<'_>, DocumentError> {
        let mut current = Container::Document(self);

        for (depth, segment) in path.segments().iter().enumerate() {
            let here = || path.head(depth + 1).to_string();

            let next: &mut Value = match current {
                Container::Document(doc) if create => doc
                    .fields
                    .entry(segment.as_key())
                    .or_insert_with(|| Value::Document(Document::new())),
                Container::Document(doc) => doc
                    .fields
                    .get_mut(&segment.as_key())
                    .ok_or_else(|| DocumentError::PathNotFound { path: here() })?,
                Container::List(items) => {
                    if !segment.is_positional() {
                        return Err(DocumentError::NotADocument {
                            path: path.head(depth).to_string(),
                            found: "list",
                        });
                    }
                    let len = items.len();
                    let index = segment
                        .position(len)
                        .ok_or_else(|| DocumentError::IndexOutOfBounds { path: here(), len })?;
                    &mut items[index]
                }
            };

            current = match next {
                Value::Document(doc) => Container::Document(doc),
                Value::List(items) => Container::List(items),
                other => {
                    return Err(DocumentError::NotAContainer {
                        path: here(),
                        found: other.type_name(),
                    });
                }
            };
        }

        Ok(current)
    }

    /// Collapse the document into a single-level map keyed by full dot-path.
    ///
    /// Empty lists and documents are kept as leaves so that
    /// [`Document::unflatten`] can rebuild them. So is any nested document
    /// with a key that would not read back as the same mapping key (empty,
    /// numeric, `-` or containing `.`). Top-level keys containing `.` are
    /// the one shape that does not survive the round trip.
    pub fn flatten(&self) -> IndexMap<String, Value> {
        let mut flat = IndexMap::new();
        for (key, value) in &self.fields {
            flatten_into(key.clone(), value, &mut flat);
        }
        flat
    }

    /// Rebuild a nested document from a flattened map.
    ///
    /// A container created for a numeric segment is a list, any other
    /// segment creates a document. List indices must arrive in order.
    pub fn unflatten<I>(flat: I) -> Result<Document, DocumentError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut doc = Document::new();
        for (key, value) in flat {
            let path = Path::parse(&key);
            if path.is_root() {
                return Err(DocumentError::EmptyPath);
            }
            insert_flat(Container::Document(&mut doc), path.segments(), value, &path, 0)?;
        }
        Ok(doc)
    }

    pub fn to_json(&self) -> String {
        serde_json::Value::from(self.clone()).to_string()
    }

    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", serde_json::Value::from(self.clone()))
    }

    /// Parse a JSON object. Date strings become [`Value::DateTime`].
    pub fn from_json(input: &str) -> Result<Document, DocumentError> {
        let json: serde_json::Value = serde_json::from_str(input)?;
        convert::json_to_document(json)
    }
}

fn child<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match value {
        Value::List(items) => segment.position(items.len()).map(|i| &items[i]),
        Value::Document(doc) => doc.fields.get(&segment.as_key()),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match value {
        Value::List(items) => {
            let index = segment.position(items.len())?;
            items.get_mut(index)
        }
        Value::Document(doc) => doc.fields.get_mut(&segment.as_key()),
        _ => None,
    }
}

/// Resolve a positional leaf against an existing list.
fn list_position(
    items: &[Value],
    leaf: &PathSegment,
    path: &Path,
    parent: &Path,
) -> Result<usize, DocumentError> {
    if !leaf.is_positional() {
        return Err(DocumentError::NotADocument {
            path: parent.to_string(),
            found: "list",
        });
    }
    leaf.position(items.len())
        .ok_or_else(|| DocumentError::IndexOutOfBounds {
            path: path.to_string(),
            len: items.len(),
        })
}

fn flatten_into(prefix: String, value: &Value, flat: &mut IndexMap<String, Value>) {
    match value {
        Value::Document(doc) if !doc.is_empty() && doc.keys().all(|k| is_plain_key(k)) => {
            for (key, child) in &doc.fields {
                flatten_into(format!("{prefix}.{key}"), child, flat);
            }
        }
        Value::List(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(format!("{prefix}.{i}"), child, flat);
            }
        }
        _ => {
            flat.insert(prefix, value.clone());
        }
    }
}

/// A key that parses back as a single field segment.
fn is_plain_key(key: &str) -> bool {
    matches!(Path::parse(key).segments(), [PathSegment::Field(name)] if !name.is_empty())
}

fn empty_container_for(next: &PathSegment) -> Value {
    if next.is_positional() {
        Value::List(Vec::new())
    } else {
        Value::Document(Document::new())
    }
}

fn insert_flat(
    container: Container<'_>,
    segments: &[PathSegment],
    value: Value,
    path: &Path,
    depth: usize,
) -> Result<(), DocumentError> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(DocumentError::EmptyPath);
    };

    let slot: &mut Value = match container {
        Container::Document(doc) => {
            if rest.is_empty() {
                doc.fields.insert(head.as_key(), value);
                return Ok(());
            }
            doc.fields
                .entry(head.as_key())
                .or_insert_with(|| empty_container_for(&rest[0]))
        }
        Container::List(items) => {
            let PathSegment::Index(index) = *head else {
                return Err(DocumentError::NotADocument {
                    path: path.head(depth).to_string(),
                    found: "list",
                });
            };
            let len = items.len();
            if index > len {
                return Err(DocumentError::IndexOutOfBounds {
                    path: path.head(depth + 1).to_string(),
                    len,
                });
            }
            if rest.is_empty() {
                if index == len {
                    items.push(value);
                } else {
                    items[index] = value;
                }
                return Ok(());
            }
            if index == len {
                items.push(empty_container_for(&rest[0]));
            }
            &mut items[index]
        }
    };

    let next = match slot {
        Value::Document(doc) => Container::Document(doc),
        Value::List(items) => Container::List(items),
        other => {
            return Err(DocumentError::NotAContainer {
                path: path.head(depth + 1).to_string(),
                found: other.type_name(),
            });
        }
    };
    insert_flat(next, rest, value, path, depth + 1)
}

impl From<IndexMap<String, Value>> for Document {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Document { fields }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Document {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new()
            .with("name", "kevin")
            .with(
                "list",
                Value::List(vec![Value::from("a"), Value::from("b")]),
            )
            .with("nested", Document::new().with("count", 3))
    }

    #[test]
    fn get_walks_lists_and_documents() {
        let doc = sample();
        assert_eq!(doc.get("list.1"), Some(&Value::from("b")));
        assert_eq!(doc.get("list.-"), Some(&Value::from("b")));
        assert_eq!(doc.get("nested.count"), Some(&Value::Integer(3)));
        assert_eq!(doc.get("list.2"), None);
        assert_eq!(doc.get("name.deeper"), None);
        assert_eq!(doc.get(""), None);
    }

    #[test]
    fn set_creates_intermediate_documents() {
        let mut doc = Document::new();
        doc.set("a.b.c", 1).unwrap();
        assert_eq!(doc.get("a.b.c"), Some(&Value::Integer(1)));
    }

    #[test]
    fn set_does_not_create_list_slots() {
        let mut doc = sample();
        let err = doc.set("list.5", "x").unwrap_err();
        assert!(matches!(err, DocumentError::IndexOutOfBounds { len: 2, .. }));
        assert!(err.is_path_error());

        doc.set("list.0", "z").unwrap();
        assert_eq!(doc.get("list.0"), Some(&Value::from("z")));
    }

    #[test]
    fn set_through_a_scalar_is_a_type_error() {
        let mut doc = sample();
        let err = doc.set("name.first", "k").unwrap_err();
        assert!(err.is_type_error());
        assert_eq!(doc.get("name"), Some(&Value::from("kevin")));
    }

    #[test]
    fn remove_is_a_noop_when_absent() {
        let mut doc = sample();
        assert_eq!(doc.remove("nope.deeper"), None);
        assert_eq!(doc.remove("list.-"), Some(Value::from("b")));
        assert_eq!(doc.get("list").and_then(Value::as_list).map(Vec::len), Some(1));
    }

    #[test]
    fn remove_preserves_key_order() {
        let mut doc = Document::new().with("a", 1).with("b", 2).with("c", 3);
        doc.remove("b");
        assert_eq!(doc.keys().collect::<Vec<_>>(), ["a", "c"]);
    }

    #[test]
    fn flatten_and_unflatten_round_trip() {
        let doc = sample().with("empty", Value::List(vec![]));
        let flat = doc.flatten();
        assert_eq!(flat.get("list.0"), Some(&Value::from("a")));
        assert_eq!(flat.get("nested.count"), Some(&Value::Integer(3)));

        for key in flat.keys() {
            assert!(doc.contains_key(key), "{key} should address the document");
        }

        let rebuilt = Document::unflatten(flat).unwrap();
        assert_eq!(rebuilt, doc);
    }

    #[test]
    fn unflatten_rejects_gaps_in_lists() {
        let flat = vec![("list.1".to_string(), Value::from("b"))];
        assert!(matches!(
            Document::unflatten(flat),
            Err(DocumentError::IndexOutOfBounds { .. })
        ));
    }
}
