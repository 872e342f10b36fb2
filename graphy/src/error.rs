//! Crate-wide error types and the JSON error envelope they serialise to.

use serde::Serialize;

use crate::parser::{ParseError as LexParseError, SourcePosition};

/// A fully qualified source location, one-based as required by the GraphQL
/// response format (the internal [`SourcePosition`] is zero-based).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

impl From<&SourcePosition> for ErrorLocation {
    fn from(pos: &SourcePosition) -> Self {
        ErrorLocation { line: pos.line() + 1, column: pos.column() + 1 }
    }
}

/// One entry in the response's `errors` array.
#[derive(Clone, Debug, Serialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// The top-level failure modes named by the engine's error-handling design:
/// parse and validation failures are terminal (no `data`), binder and limit
/// failures are terminal, resolver failures are attributed to a single field
/// and nulled out at the nearest nullable ancestor, and internal failures are
/// never echoed verbatim to callers.
#[derive(Debug, thiserror::Error)]
pub enum GraphyError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseFailure),

    #[error("validation error: {message}")]
    Validation { message: String, locations: Vec<ErrorLocation> },

    #[error("variable error: {0}")]
    Variable(String),

    #[error("limit exceeded: {0}")]
    Limit(String),

    #[error("resolver error: {0}")]
    Resolver(String),

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("{message} at line {}, column {}", location.line, location.column)]
pub struct ParseFailure {
    pub message: String,
    pub location: ErrorLocation,
}

impl GraphyError {
    pub fn internal(err: impl Into<anyhow::Error>) -> GraphyError {
        GraphyError::Internal(err.into())
    }

    pub fn validation(message: impl Into<String>) -> GraphyError {
        GraphyError::Validation { message: message.into(), locations: Vec::new() }
    }

    pub fn validation_at(message: impl Into<String>, location: ErrorLocation) -> GraphyError {
        GraphyError::Validation { message: message.into(), locations: vec![location] }
    }

    /// Render as the single `ResponseError` that belongs in a terminal
    /// (pre-execution) failure response.
    pub fn to_response_error(&self) -> ResponseError {
        match self {
            GraphyError::Parse(p) => ResponseError {
                message: p.message.clone(),
                locations: vec![p.location.clone()],
                path: Vec::new(),
            },
            GraphyError::Validation { message, locations } => {
                ResponseError { message: message.clone(), locations: locations.clone(), path: Vec::new() }
            }
            GraphyError::Variable(message) => {
                ResponseError { message: message.clone(), locations: Vec::new(), path: Vec::new() }
            }
            GraphyError::Limit(message) => {
                ResponseError { message: message.clone(), locations: Vec::new(), path: Vec::new() }
            }
            GraphyError::Resolver(message) => {
                ResponseError { message: message.clone(), locations: Vec::new(), path: Vec::new() }
            }
            GraphyError::Internal(_) => ResponseError {
                message: "internal server error".to_owned(),
                locations: Vec::new(),
                path: Vec::new(),
            },
        }
    }
}

impl From<crate::position::Spanning<LexParseError>> for GraphyError {
    fn from(spanned: crate::position::Spanning<LexParseError>) -> Self {
        GraphyError::Parse(ParseFailure {
            message: spanned.item.to_string(),
            location: ErrorLocation::from(&spanned.start),
        })
    }
}
