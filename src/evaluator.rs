use std::{cmp::Ordering, collections::HashMap, str::FromStr};

use regex::{Regex, RegexBuilder};
use rust_decimal::{Decimal, prelude::FromPrimitive};

use crate::{
    ast::{Argument, Comparison, ComparisonOperator, Node, node::parse_bool},
    date::{parse_date, truncate_to_seconds},
    document::Document,
    parser::DEFAULT_REGEX_SIZE_LIMIT,
    value::Value,
};

/// In-process evaluator for parsed FIQL expressions.
///
/// Evaluation never fails: absent fields and values that cannot be coerced
/// to the literal's type resolve to a fixed boolean per operator, so a badly
/// shaped filter simply does not match.
///
/// The evaluator only borrows its precompiled `=like=` patterns, which makes
/// it cheap to build per call and free of state between documents.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    patterns: &'a HashMap<String, Regex>,
    size_limit: usize,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator over patterns keyed by their `=like=` literal.
    ///
    /// Patterns missing from the map are compiled on demand under the
    /// regex size limit; one that does not compile never matches.
    pub fn new(patterns: &'a HashMap<String, Regex>) -> Self {
        Evaluator {
            patterns,
            size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }

    /// Bound the compiled size of patterns built on demand.
    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Whether `document` satisfies `node`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use catalog_core::{Document, Evaluator, parse_fiql};
    ///
    /// let doc = Document::new().with("StringProperty", "kevin");
    /// let node = parse_fiql("NoProperty!=stuff").unwrap();
    /// let patterns = HashMap::new();
    /// assert!(Evaluator::new(&patterns).eval(&node, &doc));
    /// ```
    pub fn eval(&self, node: &Node, document: &Document) -> bool {
        match node {
            Node::Comparison(c) => self.eval_comparison(c, document),
            Node::And(children) => children.iter().all(|child| self.eval(child, document)),
            Node::Or(children) => children.iter().any(|child| self.eval(child, document)),
        }
    }

    fn eval_comparison(&self, c: &Comparison, document: &Document) -> bool {
        use ComparisonOperator::*;

        let Some(value) = document.get(&c.path) else {
            return match c.operator {
                NotEqual | Out => true,
                Exists => c.argument.as_bool() == Some(false),
                _ => false,
            };
        };

        match (c.operator, &c.argument) {
            (Exists, argument) => argument.as_bool() == Some(true),
            (Equal, Argument::Literal(lit)) => any_element(value, |v| equals(v, lit)),
            (NotEqual, Argument::Literal(lit)) => !any_element(value, |v| equals(v, lit)),
            (op, Argument::Literal(lit)) if op.is_range() => {
                any_element(value, |v| compare(v, lit).is_some_and(|ord| in_range(op, ord)))
            }
            (In, Argument::List(items)) => {
                any_element(value, |v| items.iter().any(|lit| equals(v, lit)))
            }
            (Out, Argument::List(items)) => {
                !any_element(value, |v| items.iter().any(|lit| equals(v, lit)))
            }
            (All, Argument::List(items)) => {
                let elements = match value {
                    Value::List(values) => values.as_slice(),
                    scalar => std::slice::from_ref(scalar),
                };
                items
                    .iter()
                    .all(|lit| elements.iter().any(|v| equals(v, lit)))
            }
            (Like, Argument::Literal(pattern)) => {
                any_element(value, |v| self.is_like(v, pattern))
            }
            (Matches, Argument::Query(nested)) => match value {
                Value::List(items) => items
                    .iter()
                    .filter_map(Value::as_document)
                    .any(|element| self.eval(nested, element)),
                Value::Document(inner) => self.eval(nested, inner),
                _ => false,
            },
            // Argument shapes the parser never produces
            _ => false,
        }
    }

    fn is_like(&self, value: &Value, pattern: &str) -> bool {
        let text = value.as_string();
        match self.patterns.get(pattern) {
            Some(regex) => regex.is_match(&text),
            None => RegexBuilder::new(pattern)
                .size_limit(self.size_limit)
                .build()
                .is_ok_and(|regex| regex.is_match(&text)),
        }
    }
}

/// Evaluates `node` without precompiled patterns.
pub fn evaluate(node: &Node, document: &Document) -> bool {
    let patterns = HashMap::new();
    Evaluator::new(&patterns).eval(node, document)
}

/// List fields match when any element does; other values are tested directly.
fn any_element(value: &Value, mut test: impl FnMut(&Value) -> bool) -> bool {
    match value {
        Value::List(items) => items.iter().any(test),
        other => test(other),
    }
}

fn in_range(op: ComparisonOperator, ord: Ordering) -> bool {
    match op {
        ComparisonOperator::GreaterThan => ord == Ordering::Greater,
        ComparisonOperator::GreaterEqual => ord != Ordering::Less,
        ComparisonOperator::LessThan => ord == Ordering::Less,
        ComparisonOperator::LessEqual => ord != Ordering::Greater,
        _ => false,
    }
}

pub(crate) fn literal_decimal(lit: &str) -> Option<Decimal> {
    Decimal::from_str(lit.trim())
        .ok()
        .or_else(|| lit.trim().parse::<f64>().ok().and_then(Decimal::from_f64))
}

fn literal_date(lit: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    parse_date(lit).map(truncate_to_seconds)
}

/// Equality of a field value and a raw literal, coerced to the field's type.
fn equals(value: &Value, lit: &str) -> bool {
    match value {
        Value::String(s) => s == lit,
        Value::Integer(_) | Value::Double(_) => {
            value.as_decimal().is_some() && value.as_decimal() == literal_decimal(lit)
        }
        Value::DateTime(dt) => literal_date(lit).is_some_and(|other| other == *dt),
        Value::Boolean(b) => parse_bool(lit) == Some(*b),
        Value::Null => lit == "null",
        Value::List(_) | Value::Document(_) => false,
    }
}

/// Ordering of a field value against a raw literal; `None` when the literal
/// cannot be read as the field's type.
fn compare(value: &Value, lit: &str) -> Option<Ordering> {
    match value {
        Value::Integer(_) | Value::Double(_) => Some(value.as_decimal()?.cmp(&literal_decimal(lit)?)),
        Value::DateTime(dt) => Some(dt.cmp(&literal_date(lit)?)),
        Value::String(s) => Some(s.as_str().cmp(lit)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_fiql;

    fn check(filter: &str, doc: &Document) -> bool {
        evaluate(&parse_fiql(filter).unwrap(), doc)
    }

    #[test]
    fn on_demand_patterns_respect_size_limit() {
        let doc = Document::new().with("code", "a".repeat(100));
        let node = parse_fiql(r"code=like='\w{100}'").unwrap();
        let patterns = HashMap::new();

        assert!(check("code=like='^a{3}'", &doc));
        assert!(!Evaluator::new(&patterns).with_size_limit(16).eval(&node, &doc));
    }

    #[test]
    fn numeric_literals_follow_field_type() {
        let doc = Document::new().with("count", 5).with("ratio", 5.5);
        assert!(check("count==5.0", &doc));
        assert!(check("ratio=gt=5", &doc));
        assert!(check("ratio=le=5.5", &doc));
        assert!(!check("count==five", &doc));
        assert!(!check("count=gt=five", &doc));
    }

    #[test]
    fn list_fields_match_any_element() {
        let doc = Document::new().with(
            "tags",
            vec![Value::from("red"), Value::from("green")],
        );
        assert!(check("tags==green", &doc));
        assert!(!check("tags!=green", &doc));
        assert!(check("tags=in=(blue,red)", &doc));
        assert!(check("tags=out=(blue,black)", &doc));
    }

    #[test]
    fn booleans_and_nulls() {
        let doc = Document::new().with("active", true).with("owner", Value::Null);
        assert!(check("active==TRUE", &doc));
        assert!(!check("active==yes", &doc));
        assert!(check("owner==null", &doc));
        assert!(check("owner=exists=true", &doc));
    }

    #[test]
    fn uncompiled_pattern_is_compiled_on_demand() {
        let doc = Document::new().with("code", "LE42");
        assert!(check("code=like=^LE\\d+", &doc));
        assert!(!check("code=like='[unclosed'", &doc));
    }
}
