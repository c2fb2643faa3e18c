//! Document catalog core: dot-path documents, FIQL filters compiled to store
//! queries or in-process predicates, and structural patches.
//!
//! ```
//! use catalog_core::{Criteria, Document, Value};
//!
//! let doc = Document::new()
//!     .with("StringProperty", "kevin")
//!     .with("IntegerProperty", 5)
//!     .with("DoubleProperty", 5.5);
//!
//! let criteria = Criteria::parse("StringProperty==kevin;IntegerProperty==5;DoubleProperty=gt=4").unwrap();
//! assert!(criteria.meets(&doc));
//! ```

pub mod ast;
pub mod convert;
pub mod criteria;
pub mod date;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod geo;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod patch;
pub mod path;
pub mod query;
pub mod store;
pub mod subscription;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Argument, Comparison, ComparisonOperator, Node, Token};
pub use criteria::{Criteria, meets};
pub use document::{Document, DocumentError};
pub use error::{Error, Result};
pub use evaluator::{Evaluator, evaluate};
pub use geo::{GeoError, Shape};
pub use lexer::{LexError, Lexer, Position};
pub use output::{to_json, to_json_pretty};
pub use parser::{CompileOptions, ParseError, Parser, parse_fiql, parse_fiql_with};
pub use patch::{OpKind, Patch, PatchError, PatchOperation, PatchOutcome, apply_patch};
pub use path::{Path, PathSegment};
pub use query::{coerce_literal, compile_filter};
pub use store::{DataCoherence, DocumentStore, MemoryStore, StoreError, StoreQuery};
pub use subscription::{Subscription, SubscriptionSet};
pub use value::Value;
