/**
 * Error Handling Module
 *
 * DESIGN DECISION: Centralized error type using thiserror, one variant per
 * failure mode named in the engine's error handling design
 * WHY: The classification pipeline never panics; every expected failure is
 * an explicit return value that the gateway maps to an HTTP status
 *
 * PATTERN: Rust error handling best practices
 */

use thiserror::Error;

/// Primary error type for the classification engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed request or out-of-range field (bad numeric range, bad pattern id shape).
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// Weave unit text is empty or whitespace-only after trimming.
    #[error("empty_text")]
    EmptyText,

    /// No snapshot has been published yet.
    #[error("index_empty")]
    IndexEmpty,

    /// Embedding model failed, or input could not be embedded.
    #[error("embedding failure: {0}")]
    EmbeddingFailure(String),

    /// Query/snapshot dimension mismatch, or search invoked on an empty index.
    #[error("search failure: {0}")]
    SearchFailure(String),

    /// Request exceeded its wall-clock deadline.
    #[error("deadline_exceeded")]
    DeadlineExceeded,

    /// Too many in-flight classifications.
    #[error("overloaded")]
    Overloaded,

    /// Pattern referenced by a vector row is missing from the catalogue.
    /// Should not occur under the invariant that vectors and patterns share ids.
    #[error("unknown pattern: {0}")]
    UnknownPattern(String),

    /// Artifact failed structural, model, or dimension validation on reload.
    #[error("load failure: {0}")]
    LoadFailure(String),

    /// I/O error reading an artifact or config file.
    #[error("I/O error: {0}")]
    Io(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status code the gateway reports for this error, per the wire protocol.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InputInvalid(_) => 400,
            Error::EmptyText => 400,
            Error::IndexEmpty => 503,
            Error::Overloaded => 503,
            Error::DeadlineExceeded => 504,
            Error::EmbeddingFailure(_) => 500,
            Error::SearchFailure(_) => 500,
            Error::UnknownPattern(_) => 500,
            Error::LoadFailure(_) => 500,
            Error::Io(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in `errorMessage` on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InputInvalid(_) => "invalid_input",
            Error::EmptyText => "empty_text",
            Error::IndexEmpty => "index_empty",
            Error::Overloaded => "overloaded",
            Error::DeadlineExceeded => "deadline_exceeded",
            Error::EmbeddingFailure(_) => "embedding_failure",
            Error::SearchFailure(_) => "search_failure",
            Error::UnknownPattern(_) => "unknown_pattern",
            Error::LoadFailure(_) => "load_failure",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("serialization error: {err}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
