//! Compiled, reusable FIQL predicates.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::{
    ast::{ComparisonOperator, Node},
    document::Document,
    evaluator::Evaluator,
    parser::{CompileOptions, ParseError, parse_fiql_with},
};

/// An immutable predicate over documents.
///
/// Holds the parsed expression, the prefix it was compiled with and every
/// `=like=` pattern already compiled. Evaluation takes `&self` and keeps no
/// state between calls, so one `Criteria` can be shared across threads and
/// evaluated concurrently.
#[derive(Debug, Clone)]
pub struct Criteria {
    node: Node,
    prefix: Option<String>,
    patterns: HashMap<String, Regex>,
}

impl Criteria {
    /// Compile `text` with default options.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::compile_with(text, &CompileOptions::default())
    }

    /// Compile `text`, scoping every selector under `prefix`.
    pub fn parse_with_prefix(text: &str, prefix: &str) -> Result<Self, ParseError> {
        Self::compile_with(text, &CompileOptions::with_prefix(prefix))
    }

    pub fn compile_with(text: &str, options: &CompileOptions) -> Result<Self, ParseError> {
        let node = parse_fiql_with(text, options)?;
        let criteria = Self::build(node, options.prefix.clone(), options.regex_size_limit)?;
        debug!(
            filter = text,
            prefix = ?criteria.prefix,
            comparisons = criteria.node.comparisons().len(),
            patterns = criteria.patterns.len(),
            "compiled criteria"
        );
        Ok(criteria)
    }

    /// Wrap an already parsed expression.
    pub fn from_node(node: Node) -> Result<Self, ParseError> {
        Self::build(node, None, CompileOptions::default().regex_size_limit)
    }

    fn build(node: Node, prefix: Option<String>, size_limit: usize) -> Result<Self, ParseError> {
        let mut patterns = HashMap::new();

        for comparison in node.comparisons() {
            if comparison.operator != ComparisonOperator::Like {
                continue;
            }
            for pattern in comparison.argument.literals() {
                if patterns.contains_key(pattern) {
                    continue;
                }
                let regex = RegexBuilder::new(pattern)
                    .size_limit(size_limit)
                    .build()
                    .map_err(|e| ParseError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
                patterns.insert(pattern.clone(), regex);
            }
        }

        Ok(Criteria {
            node,
            prefix,
            patterns,
        })
    }

    /// Whether `document` satisfies this criteria.
    pub fn meets(&self, document: &Document) -> bool {
        Evaluator::new(&self.patterns).eval(&self.node, document)
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

/// Absent criteria holds for every document.
pub fn meets(criteria: Option<&Criteria>, document: &Document) -> bool {
    criteria.is_none_or(|c| c.meets(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn criteria_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Criteria>();
    }

    #[test]
    fn absent_criteria_always_meets() {
        assert!(meets(None, &Document::new()));
        assert!(meets(None, &Document::new().with("a", 1)));
    }

    #[test]
    fn prefix_scopes_every_selector() {
        let criteria = Criteria::parse_with_prefix("kind==alert;level=ge=3", "Doc").unwrap();
        assert_eq!(criteria.prefix(), Some("Doc"));

        let inner = Document::new().with("kind", "alert").with("level", 4);
        let doc = Document::new().with("Doc", inner.clone());
        assert!(criteria.meets(&doc));
        assert!(!criteria.meets(&inner));
    }

    #[test]
    fn invalid_pattern_is_rejected_at_compile_time() {
        let err = Criteria::parse("code=like='(unclosed'").unwrap_err();
        assert!(matches!(err, ParseError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn pattern_size_limit_applies() {
        let options = CompileOptions {
            regex_size_limit: 16,
            ..CompileOptions::default()
        };
        let err = Criteria::compile_with("code=like='\\w{100}'", &options).unwrap_err();
        assert!(matches!(err, ParseError::InvalidPattern { .. }));
    }

    #[test]
    fn reuse_does_not_leak_state() {
        let criteria = Criteria::parse("name=like=^k").unwrap();
        let kevin = Document::new().with("name", "kevin");
        let bob = Document::new().with("name", Value::from("bob"));
        for _ in 0..3 {
            assert!(criteria.meets(&kevin));
            assert!(!criteria.meets(&bob));
        }
    }
}
