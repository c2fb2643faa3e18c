//! Crate-level error type.

use thiserror::Error;

use crate::{
    document::DocumentError, geo::GeoError, lexer::LexError, parser::ParseError,
    patch::PatchError, store::StoreError,
};

/// Any error raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// Malformed FIQL text, including `=matches=` sub-queries and patterns.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Lex(_) | Error::Parse(_))
    }

    /// Missing paths and out-of-range indices, from documents or patches.
    pub fn is_path_error(&self) -> bool {
        match self {
            Error::Document(e) => e.is_path_error(),
            Error::Patch(e) => e.is_path_error(),
            _ => false,
        }
    }

    /// List operations on non-lists and key access on non-documents.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Document(e) => e.is_type_error(),
            Error::Patch(e) => e.is_type_error(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
