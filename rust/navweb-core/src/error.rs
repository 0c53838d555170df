use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every fallible load path in the crate.
pub type Result<T> = std::result::Result<T, NavError>;

/// Errors raised while loading or validating navigation data.
///
/// Per-query absence (no path, unreachable entity) is never an error; it is
/// reported through `Option` or a `RouteStatus`.
#[derive(Debug, Error)]
pub enum NavError {
    /// Underlying filesystem failure.
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document was not valid JSON or did not match the expected shape.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    /// A case-insensitive enumeration field carried a value we do not know.
    #[error("unknown {kind} value: {value}")]
    UnknownEnum { kind: &'static str, value: String },

    /// Two nodes in one document share an id.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge references a node that is not part of the loaded set.
    #[error("edge {from} -> {to} references missing node {missing}")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },

    /// Edge costs are tick counts and may not be negative.
    #[error("edge {from} -> {to} has negative cost {cost}")]
    NegativeCost { from: String, to: String, cost: i64 },

    /// Structural problem not covered by a more specific variant.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl NavError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NavError::Io { path: path.into(), source }
    }

    pub(crate) fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        NavError::UnknownEnum { kind, value: value.into() }
    }
}
