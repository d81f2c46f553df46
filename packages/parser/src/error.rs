//! Error types for the parser.
//!
//! `ParserError` covers both the document-scoped failures that abort an
//! automatic parse (`StructuralConflict`) and the article- or footnote-scoped
//! failures that the document driver downgrades to extraction issues.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position of an event in the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Index of the event in the document's event list.
    pub event: usize,

    /// Line in the source file, when the tokenizer knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl SourceLocation {
    #[must_use]
    pub fn new(event: usize, line: Option<usize>) -> Self {
        Self { event, line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "event {} (line {line})", self.event),
            None => write!(f, "event {}", self.event),
        }
    }
}

/// Main error type for the parser library.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Duplicate structure that cannot be merged automatically.
    #[error("structural conflict on '{label}' between {first} and {second}: {reason}")]
    StructuralConflict {
        label: String,
        first: SourceLocation,
        second: SourceLocation,
        reason: String,
    },

    /// Unbalanced or mismatched bracket span ids.
    #[error("bracket mismatch at offset {offset}: expected {}, found {}",
        .expected.as_deref().map(|id| format!("]{id}")).unwrap_or_else(|| "no closer".to_string()),
        .found.as_deref().map(|id| format!("]{id}")).unwrap_or_else(|| "end of text".to_string()))]
    BracketMismatch {
        offset: usize,
        expected: Option<String>,
        found: Option<String>,
    },

    /// Bracket span whose id has no entry in the article's footnote table.
    #[error("footnote reference ({reference_number}) in {anchor_id} has no footnote")]
    DanglingFootnoteReference {
        anchor_id: String,
        reference_number: String,
    },

    /// Citation string that matches no known grammar.
    #[error("unrecognized citation: {0}")]
    CitationParse(String),

    /// Invalid dossier number format.
    #[error("invalid dossier number: '{0}'. Expected YYYY-MM-DD/N (e.g., 2016-01-15/17)")]
    InvalidDossierNumber(String),

    /// Invalid date format.
    #[error("invalid date: '{0}'. Expected YYYY-MM-DD (e.g., 2020-01-01)")]
    InvalidDate(String),

    /// Replacement document that breaks a model invariant.
    #[error("override for {dossier_number} is invalid: {reason}")]
    InvalidOverride {
        dossier_number: String,
        reason: String,
    },

    /// Two replacement documents for the same dossier.
    #[error("more than one override for dossier {0}")]
    DuplicateOverride(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ParserError {
    /// Whether the error aborts the automatic parse of a whole document.
    #[must_use]
    pub fn is_document_scoped(&self) -> bool {
        matches!(self, Self::StructuralConflict { .. })
    }
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;
