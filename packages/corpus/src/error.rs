//! Error types for the corpus runner.

use thiserror::Error;

use justel_parser::ParserError;

/// Main error type for corpus runs.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Parsing or loading a document failed.
    #[error(transparent)]
    Parser(#[from] ParserError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking parse task panicked or was cancelled.
    #[error("parse task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("configuration error: {0}")]
    Config(String),

    /// A document exceeded the per-document time limit.
    #[error("parsing {0} timed out")]
    Timeout(String),
}

/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, CorpusError>;
