use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde::{Deserialize, Serialize};

use crate::{date, document::Document};

/// A value stored in a catalog [`Document`].
///
/// Unlike plain JSON, the model keeps integers apart from doubles and carries
/// a dedicated `DateTime` variant for instants recognised on read.
///
/// # Examples
///
/// ```
/// use catalog_core::{Document, Value};
///
/// let doc = Document::new()
///     .with("name", "kevin")
///     .with("count", 5)
///     .with("tags", Value::List(vec!["a".into(), "b".into()]));
///
/// assert_eq!(doc.get("count"), Some(&Value::Integer(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// JSON null
    Null,

    /// JSON boolean
    Boolean(bool),

    /// 64-bit integer
    Integer(i64),

    /// Double precision number
    Double(f64),

    /// UTF-8 string
    String(String),

    /// UTC instant with second precision
    DateTime(DateTime<Utc>),

    /// Ordered list of values
    List(Vec<Value>),

    /// Nested document
    Document(Document),
}

impl Value {
    /// Human readable name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Document(_) => "document",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for every variant that is neither a list nor a document.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Document(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Exact decimal view of a numeric value.
    ///
    /// Integers and doubles are compared through this so that `5` and `5.0`
    /// are the same number and large integers do not lose precision.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(n) => Some(Decimal::from(*n)),
            Value::Double(n) => Decimal::from_f64(*n),
            _ => None,
        }
    }

    /// String form used by regex matching and flat wire comparison.
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Double(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::DateTime(dt) => date::format_date(dt),
            Value::Null => "null".to_string(),
            Value::List(_) | Value::Document(_) => crate::output::to_json(self),
        }
    }

    /// Equality that treats integers and doubles holding the same number as
    /// equal, recursively through lists and documents.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(_) | Value::Double(_), Value::Integer(_) | Value::Double(_)) => {
                match (self.as_decimal(), other.as_decimal()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Value::Document(a), Value::Document(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get_field(k).is_some_and(|w| v.same_as(w)))
            }
            _ => self == other,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(date::truncate_to_seconds(dt))
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_and_doubles_compare_by_number() {
        assert!(Value::Integer(5).same_as(&Value::Double(5.0)));
        assert!(!Value::Integer(5).same_as(&Value::Double(5.5)));
        assert!(!Value::Integer(5).same_as(&Value::String("5".into())));
    }

    #[test]
    fn documents_compare_regardless_of_key_order() {
        let a = Document::new().with("x", 1).with("y", 2.0);
        let b = Document::new().with("y", 2).with("x", 1);
        assert!(Value::Document(a).same_as(&Value::Document(b)));
    }

    #[test]
    fn as_string_renders_dates_canonically() {
        let dt = date::parse_date("2021-03-04 05:06:07+01:00").unwrap();
        assert_eq!(Value::from(dt).as_string(), "2021-03-04T04:06:07Z");
    }
}
