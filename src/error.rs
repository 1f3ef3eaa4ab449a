//! Error types for the topogas training engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for topogas operations.
///
/// Every variant raised by the training core is fatal for the run that
/// produced it: the step that failed is not retried and the trainer stops.
#[derive(Error, Debug)]
pub enum TopogasError {
    /// A parameter is missing, malformed or outside its domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two vectors that must share a dimension do not.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The dimension that was required.
        expected: usize,
        /// The dimension that was supplied.
        found: usize,
    },

    /// A node or edge was looked up that is not part of the graph.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A ranking or graph query needed more entries than were present.
    #[error("Empty: {0}")]
    Empty(String),

    /// More than one edge joins the same pair of nodes.
    #[error("Ambiguous connection between {0} and {1}")]
    AmbiguousConnection(u64, u64),

    /// A data file could not be parsed.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// File being read.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The training worker died or its channel closed.
    #[error("Worker error: {0}")]
    Worker(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for topogas operations.
pub type Result<T> = std::result::Result<T, TopogasError>;

impl TopogasError {
    /// Shorthand for an [`TopogasError::InvalidParameter`] error.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TopogasError::InvalidParameter(message.into())
    }

    /// Shorthand for a [`TopogasError::DimensionMismatch`] error.
    pub(crate) fn dimension(expected: usize, found: usize) -> Self {
        TopogasError::DimensionMismatch { expected, found }
    }
}
