//! The document-store seam.
//!
//! Persistence lives outside this crate. A store receives a [`StoreQuery`]
//! (the compiled native filter plus the criteria it came from) and returns a
//! cursor of documents.

use serde::{Deserialize, Serialize};
use serde_json::{Value as Json, json};
use thiserror::Error;
use tracing::debug;

use crate::{
    criteria::{self, Criteria},
    document::Document,
    parser::{CompileOptions, ParseError},
    query::compile_filter,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot run this kind of query
    #[error("unsupported query: {reason}")]
    Unsupported { reason: String },

    #[error("store backend error: {message}")]
    Backend { message: String },
}

/// Whether a read must hit the authoritative replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCoherence {
    /// Read from the primary only
    #[default]
    Consistent,
    /// Any replica will do
    Available,
}

impl DataCoherence {
    /// Read preference name understood by MongoDB drivers.
    pub fn read_preference(&self) -> &'static str {
        match self {
            DataCoherence::Consistent => "primary",
            DataCoherence::Available => "secondaryPreferred",
        }
    }
}

/// A compiled query ready to hand to a [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct StoreQuery {
    filter: Json,
    criteria: Option<Criteria>,
    geo: Option<Json>,
    coherence: DataCoherence,
}

impl StoreQuery {
    /// A query matching every document.
    pub fn all() -> Self {
        StoreQuery {
            filter: json!({}),
            ..Self::default()
        }
    }

    pub fn from_fiql(text: &str) -> Result<Self, ParseError> {
        Self::compile_with(text, &CompileOptions::default())
    }

    /// Compile `text` with every selector scoped under `prefix`.
    pub fn with_prefix(text: &str, prefix: &str) -> Result<Self, ParseError> {
        Self::compile_with(text, &CompileOptions::with_prefix(prefix))
    }

    pub fn compile_with(text: &str, options: &CompileOptions) -> Result<Self, ParseError> {
        let criteria = Criteria::compile_with(text, options)?;
        let filter = compile_filter(criteria.node());
        debug!(filter = %filter, "compiled store query");
        Ok(StoreQuery {
            filter,
            criteria: Some(criteria),
            geo: None,
            coherence: DataCoherence::default(),
        })
    }

    /// Constrain the query with a geometric fragment from [`crate::geo`].
    pub fn and_geo(mut self, fragment: Json) -> Self {
        self.geo = Some(match self.geo.take() {
            Some(existing) => json!({ "$and": [existing, fragment] }),
            None => fragment,
        });
        self
    }

    pub fn with_coherence(mut self, coherence: DataCoherence) -> Self {
        self.coherence = coherence;
        self
    }

    /// The native filter, geometric constraints included.
    pub fn filter(&self) -> Json {
        let base = match &self.filter {
            Json::Null => json!({}),
            filter => filter.clone(),
        };
        match &self.geo {
            None => base,
            Some(geo) if base.as_object().is_some_and(|o| o.is_empty()) => geo.clone(),
            Some(geo) => json!({ "$and": [base, geo] }),
        }
    }

    pub fn criteria(&self) -> Option<&Criteria> {
        self.criteria.as_ref()
    }

    pub fn coherence(&self) -> DataCoherence {
        self.coherence
    }

    pub fn has_geo(&self) -> bool {
        self.geo.is_some()
    }

    /// Whether a document satisfies the non-geometric part of the query.
    pub fn matches(&self, document: &Document) -> bool {
        criteria::meets(self.criteria.as_ref(), document)
    }
}

/// Something that can run a compiled query.
pub trait DocumentStore {
    type Cursor: Iterator<Item = Document>;

    fn find(&self, query: &StoreQuery) -> Result<Self::Cursor, StoreError>;
}

/// In-memory store that evaluates queries with the in-process evaluator.
///
/// Useful for tests and for small embedded catalogs. Geometric queries are
/// rejected since there is no spatial index to answer them.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<Document> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        MemoryStore {
            documents: iter.into_iter().collect(),
        }
    }
}

impl DocumentStore for MemoryStore {
    type Cursor = std::vec::IntoIter<Document>;

    fn find(&self, query: &StoreQuery) -> Result<Self::Cursor, StoreError> {
        if query.has_geo() {
            return Err(StoreError::Unsupported {
                reason: "memory store has no spatial index".to_string(),
            });
        }

        let found: Vec<Document> = self
            .documents
            .iter()
            .filter(|doc| query.matches(doc))
            .cloned()
            .collect();
        debug!(
            scanned = self.documents.len(),
            found = found.len(),
            coherence = query.coherence().read_preference(),
            "memory store find"
        );
        Ok(found.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Shape, near};

    #[test]
    fn geo_fragment_is_combined_with_filter() {
        let shape = Shape::point(10.0, 20.0).unwrap();
        let query = StoreQuery::from_fiql("kind==alert")
            .unwrap()
            .and_geo(near("location", &shape, None));

        let filter = query.filter();
        let parts = filter["$and"].as_array().unwrap();
        assert_eq!(parts[0], json!({ "kind": "alert" }));
        assert_eq!(parts[1]["location"]["$near"]["$geometry"]["type"], "Point");
    }

    #[test]
    fn geo_only_query() {
        let shape = Shape::point(10.0, 20.0).unwrap();
        let query = StoreQuery::all().and_geo(near("location", &shape, Some(500.0)));
        assert_eq!(query.filter()["location"]["$near"]["$maxDistance"], json!(500.0));
    }

    #[test]
    fn coherence_defaults_to_consistent() {
        let query = StoreQuery::all();
        assert_eq!(query.coherence(), DataCoherence::Consistent);
        let query = query.with_coherence(DataCoherence::Available);
        assert_eq!(query.coherence().read_preference(), "secondaryPreferred");
    }
}
