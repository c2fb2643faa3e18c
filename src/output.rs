//! JSON rendering for catalog values.
//!
//! Rendering goes through `serde_json` so escaping and number formatting
//! follow standard JSON. Document keys keep their insertion order and dates
//! are written in canonical `YYYY-MM-DDTHH:MM:SSZ` form.
//!
//! # Examples
//!
//! ```
//! use catalog_core::Value;
//! use catalog_core::output::{to_json, to_json_pretty};
//!
//! let value = Value::Integer(42);
//!
//! // Compact output
//! assert_eq!(to_json(&value), "42");
//!
//! // Pretty output (identical for simple values)
//! assert_eq!(to_json_pretty(&value), "42");
//! ```

use crate::{convert::value_to_json, value::Value};

/// Compact JSON.
pub fn to_json(value: &Value) -> String {
    value_to_json(value.clone()).to_string()
}

/// JSON with 2-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    format!("{:#}", value_to_json(value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{date, document::Document};

    #[test]
    fn nested_values() {
        let doc = Document::new()
            .with("when", date::parse_date("2020-01-01T00:00:00Z").unwrap())
            .with("list", Value::List(vec![Value::Integer(1), Value::Null]));
        assert_eq!(
            to_json(&Value::Document(doc)),
            r#"{"when":"2020-01-01T00:00:00Z","list":[1,null]}"#
        );
    }

    #[test]
    fn pretty_output_indents() {
        let value = Value::Document(Document::new().with("a", 1));
        assert_eq!(to_json_pretty(&value), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(to_json(&Value::from("a\"b\n")), r#""a\"b\n""#);
    }
}
