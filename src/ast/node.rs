use std::fmt;

use crate::ast::ComparisonOperator;

/// Untyped argument text. Coercion is left to each back-end.
pub type RawLiteral = String;

/// Parsed FIQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `path operator argument`
    Comparison(Comparison),

    /// Every child must hold (`;`)
    And(Vec<Node>),

    /// At least one child must hold (`,`)
    Or(Vec<Node>),
}

/// A single `path operator argument` test.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Dot-path of the compared field, prefix already applied
    pub path: String,
    pub operator: ComparisonOperator,
    pub argument: Argument,
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// One literal
    Literal(RawLiteral),

    /// `(v1,v2,...)` for `=in=`, `=out=` and `=all=`
    List(Vec<RawLiteral>),

    /// Nested expression of `=matches=`, parsed eagerly so that a malformed
    /// sub-query is rejected together with its parent
    Query(Box<Node>),
}

impl Argument {
    /// The literals of this argument: one for `Literal`, all for `List`,
    /// none for `Query`.
    pub fn literals(&self) -> &[RawLiteral] {
        match self {
            Argument::Literal(lit) => std::slice::from_ref(lit),
            Argument::List(items) => items,
            Argument::Query(_) => &[],
        }
    }

    /// `=exists=` argument as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::Literal(lit) => parse_bool(lit),
            _ => None,
        }
    }
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

impl Node {
    /// Combine two nodes with AND, flattening nested ANDs.
    pub fn and(self, other: Node) -> Node {
        match (self, other) {
            (Node::And(mut left), Node::And(right)) => {
                left.extend(right);
                Node::And(left)
            }
            (Node::And(mut left), right) => {
                left.push(right);
                Node::And(left)
            }
            (left, Node::And(mut right)) => {
                right.insert(0, left);
                Node::And(right)
            }
            (left, right) => Node::And(vec![left, right]),
        }
    }

    /// Every comparison in this tree, nested `=matches=` queries included.
    pub fn comparisons(&self) -> Vec<&Comparison> {
        let mut out = Vec::new();
        self.collect_comparisons(&mut out);
        out
    }

    fn collect_comparisons<'a>(&'a self, out: &mut Vec<&'a Comparison>) {
        match self {
            Node::Comparison(c) => {
                out.push(c);
                if let Argument::Query(nested) = &c.argument {
                    nested.collect_comparisons(out);
                }
            }
            Node::And(children) | Node::Or(children) => {
                for child in children {
                    child.collect_comparisons(out);
                }
            }
        }
    }
}

/// Quote a literal when it would not survive as a bare token.
fn write_literal(f: &mut fmt::Formatter<'_>, lit: &str) -> fmt::Result {
    let bare = !lit.is_empty()
        && !lit
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | ',' | '(' | ')' | '\'' | '"' | '\\'));
    if bare {
        f.write_str(lit)
    } else {
        write!(f, "'{}'", lit.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path, self.operator)?;
        match &self.argument {
            Argument::Literal(lit) => write_literal(f, lit),
            Argument::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_literal(f, item)?;
                }
                f.write_str(")")
            }
            Argument::Query(nested) => write_literal(f, &nested.to_string()),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Comparison(c) => write!(f, "{c}"),
            Node::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    match child {
                        Node::Or(_) => write!(f, "({child})")?,
                        _ => write!(f, "{child}")?,
                    }
                }
                Ok(())
            }
            Node::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}
