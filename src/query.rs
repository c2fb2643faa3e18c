//! Store-query compiler.
//!
//! Folds a FIQL [`Node`] into a MongoDB-shaped filter document. Literals are
//! coerced one at a time, independently of the field they are compared with:
//! integer, then decimal, then date, then string.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value as Json, json};

use crate::{
    ast::{Argument, Comparison, ComparisonOperator, Node},
    date::{format_date, parse_date},
};

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern is valid"));

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?$").expect("decimal pattern is valid")
});

/// Coerce a raw literal for a store query.
///
/// Dates are written in extended-JSON form (`{"$date": "..."}`) so that the
/// store compares them as instants rather than strings.
pub fn coerce_literal(lit: &str) -> Json {
    if INTEGER.is_match(lit)
        && let Ok(n) = lit.parse::<i64>()
    {
        return Json::from(n);
    }
    if DECIMAL.is_match(lit)
        && let Some(n) = lit.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
    {
        return Json::Number(n);
    }
    if let Some(dt) = parse_date(lit) {
        return json!({ "$date": format_date(&dt) });
    }
    Json::String(lit.to_string())
}

/// Compile an expression to a store filter.
pub fn compile_filter(node: &Node) -> Json {
    match node {
        Node::Comparison(c) => compile_comparison(c),
        Node::And(children) => json!({ "$and": children.iter().map(compile_filter).collect::<Vec<_>>() }),
        Node::Or(children) => json!({ "$or": children.iter().map(compile_filter).collect::<Vec<_>>() }),
    }
}

fn compile_comparison(c: &Comparison) -> Json {
    use ComparisonOperator::*;

    let condition = match (c.operator, &c.argument) {
        (Equal, Argument::Literal(lit)) => coerce_literal(lit),
        (Like, Argument::Literal(pattern)) => json!({ "$regex": pattern }),
        (Exists, argument) => json!({ "$exists": argument.as_bool().unwrap_or(true) }),
        (Matches, Argument::Query(nested)) => json!({ "$elemMatch": compile_filter(nested) }),
        (op, Argument::Literal(lit)) => operator_clause(op, coerce_literal(lit)),
        (op, Argument::List(items)) => {
            operator_clause(op, Json::Array(items.iter().map(|lit| coerce_literal(lit)).collect()))
        }
        (op, Argument::Query(nested)) => operator_clause(op, compile_filter(nested)),
    };

    let mut filter = Map::new();
    filter.insert(c.path.clone(), condition);
    Json::Object(filter)
}

fn operator_clause(op: ComparisonOperator, operand: Json) -> Json {
    let name = match op {
        ComparisonOperator::NotEqual => "$ne",
        ComparisonOperator::GreaterThan => "$gt",
        ComparisonOperator::GreaterEqual => "$gte",
        ComparisonOperator::LessThan => "$lt",
        ComparisonOperator::LessEqual => "$lte",
        ComparisonOperator::In => "$in",
        ComparisonOperator::Out => "$nin",
        ComparisonOperator::All => "$all",
        ComparisonOperator::Like => "$regex",
        ComparisonOperator::Matches => "$elemMatch",
        ComparisonOperator::Exists => "$exists",
        ComparisonOperator::Equal => "$eq",
    };
    let mut clause = Map::new();
    clause.insert(name.to_string(), operand);
    Json::Object(clause)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_precedence() {
        assert_eq!(coerce_literal("42"), json!(42));
        assert_eq!(coerce_literal("-7"), json!(-7));
        assert_eq!(coerce_literal("4.5"), json!(4.5));
        assert_eq!(coerce_literal("1e3"), json!(1000.0));
        assert_eq!(
            coerce_literal("2014-05-30T15:45:10+0200"),
            json!({ "$date": "2014-05-30T13:45:10Z" })
        );
        assert_eq!(coerce_literal("true"), json!("true"));
        assert_eq!(coerce_literal("kevin"), json!("kevin"));
    }

    #[test]
    fn integer_overflow_falls_back_to_decimal() {
        assert_eq!(coerce_literal("99999999999999999999"), json!(1e20));
    }
}
