//! # FIQL - Abstract Syntax Tree
//!
//! This module defines the tree a FIQL (Feed Item Query Language) filter is
//! parsed into. Both criteria back-ends, the store-query compiler and the
//! in-process evaluator, fold over the same [`Node`] type.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Comparison operators (`==`, `=gt=`, `=matches=`, ...)
//! - **[node]** - Comparison / AND / OR nodes and their arguments
//!
//! ## Quick Start
//!
//! ```text
//! StringProperty==kevin;IntegerProperty=ge=5,Tags=all=(wx,alert)
//! ```
//!
//! `;` binds tighter than `,`, so this reads as
//! `(StringProperty == kevin AND IntegerProperty >= 5) OR Tags contains all of (wx, alert)`.
//!
//! ## Arguments
//!
//! Arguments stay untyped text. Each back-end coerces them on its own
//! terms: the store compiler picks integer, double, date or string from the
//! text alone, the evaluator coerces against the type found in the document.
//!
//! - bare token: `kevin`, `5`, `2014-05-30T13:45:10Z`
//! - quoted: `'Severe weather'`, `"^(LC|LE).*"`
//! - list: `(a,b,'c d')`
//! - nested query (`=matches=` only): `"valueName==UGC;value==X"`
pub mod node;
pub mod operators;
pub mod tokens;

pub use node::{Argument, Comparison, Node, RawLiteral};
pub use operators::ComparisonOperator;
pub use tokens::Token;
