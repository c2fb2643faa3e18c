//! JSON <-> catalog Value conversion utilities

use chrono::{DateTime, Utc};

use crate::{
    date,
    document::{Document, DocumentError},
    value::Value,
};

/// Extended-JSON key carrying a date (`{"$date": "..."}`).
const DATE_KEY: &str = "$date";

/// Convert serde_json::Value to a catalog Value.
///
/// Strings that parse as dates become [`Value::DateTime`], as do
/// `{"$date": ...}` wrappers holding a date string or epoch milliseconds.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                n.as_f64().map(Value::Double).unwrap_or(Value::Null)
            }
        }
        serde_json::Value::String(s) => match date::parse_date(&s) {
            Some(dt) => Value::DateTime(dt),
            None => Value::String(s),
        },
        serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            if obj.len() == 1
                && let Some(dt) = obj.get(DATE_KEY).and_then(extended_date)
            {
                return Value::DateTime(dt);
            }
            Value::Document(obj.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}

fn extended_date(v: &serde_json::Value) -> Option<DateTime<Utc>> {
    match v {
        serde_json::Value::String(s) => date::parse_date(s),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(date::truncate_to_seconds),
        _ => None,
    }
}

/// Convert a catalog Value to serde_json::Value.
///
/// Dates are written as canonical `YYYY-MM-DDTHH:MM:SSZ` strings and
/// non-finite doubles as `null`.
pub fn value_to_json(v: Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::DateTime(dt) => serde_json::Value::String(date::format_date(&dt)),
        Value::List(arr) => serde_json::Value::Array(arr.into_iter().map(value_to_json).collect()),
        Value::Document(doc) => document_to_json(doc),
    }
}

pub fn document_to_json(doc: Document) -> serde_json::Value {
    serde_json::Value::Object(doc.into_iter().map(|(k, v)| (k, value_to_json(v))).collect())
}

/// Convert a JSON object into a [`Document`].
pub fn json_to_document(v: serde_json::Value) -> Result<Document, DocumentError> {
    match json_to_value(v) {
        Value::Document(doc) => Ok(doc),
        other => Err(DocumentError::NotAnObject {
            found: other.type_name(),
        }),
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        json_to_value(v)
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        value_to_json(v)
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = DocumentError;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        json_to_document(v)
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        document_to_json(doc)
    }
}
