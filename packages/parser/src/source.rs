//! Source documents: the flat event stream consumed by the parser.
//!
//! A source document is produced by the markdown tokenizer or loaded from a
//! JSON/YAML file. Headings and article bodies appear in source order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{AmendmentDeclaration, ExternalLinks, NodeKind};

/// Descriptive fields as found in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page_number: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub end_validity_date: Option<String>,
    #[serde(default)]
    pub justel_url: Option<String>,
    #[serde(default)]
    pub publication_pdf_url: Option<String>,
    #[serde(default)]
    pub consolidated_pdf_url: Option<String>,
}

/// One event of the source stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SourceEvent {
    /// A structural heading (livre, titre, chapitre, ...).
    Heading {
        /// Pre-classified type; classified by the heading grammar when absent.
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<NodeKind>,
        title_type: String,
        #[serde(default)]
        title_content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rank: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<usize>,
    },

    /// Raw body of an article, footnote section included.
    Article {
        number: String,
        #[serde(default)]
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<usize>,
    },
}

impl SourceEvent {
    /// Create an unclassified heading event.
    #[must_use]
    pub fn heading(title_type: impl Into<String>, title_content: impl Into<String>) -> Self {
        Self::Heading {
            kind: None,
            title_type: title_type.into(),
            title_content: title_content.into(),
            rank: None,
            line: None,
        }
    }

    /// Create an article event.
    #[must_use]
    pub fn article(number: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Article {
            number: number.into(),
            body: body.into(),
            line: None,
        }
    }

    /// Attach a source line.
    #[must_use]
    pub fn at_line(mut self, at: usize) -> Self {
        match &mut self {
            Self::Heading { line, .. } | Self::Article { line, .. } => *line = Some(at),
        }
        self
    }

    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Heading { line, .. } | Self::Article { line, .. } => *line,
        }
    }
}

/// A source document identified by its dossier number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub dossier_number: String,
    #[serde(default)]
    pub metadata: SourceMetadata,
    #[serde(default)]
    pub preamble: Option<String>,
    /// Text of a notice repealing the whole document.
    #[serde(default)]
    pub abrogation_text: Option<String>,
    #[serde(default)]
    pub external_links: ExternalLinks,
    #[serde(default)]
    pub amends: Vec<AmendmentDeclaration>,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub events: Vec<SourceEvent>,
}

impl SourceDocument {
    #[must_use]
    pub fn new(dossier_number: impl Into<String>) -> Self {
        Self {
            dossier_number: dossier_number.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: Vec<SourceEvent>) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_amendment(
        mut self,
        dossier_number: impl Into<String>,
        modified_articles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.amends.push(AmendmentDeclaration {
            dossier_number: dossier_number.into(),
            modified_articles: modified_articles.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Parse a source document from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a source document from YAML.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load a source document, picking the format from the file extension.
    ///
    /// `.json` is read as JSON, `.yaml`/`.yml` as YAML, and anything else is
    /// treated as gazette markdown and run through the tokenizer with the
    /// file stem as fallback dossier number.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let mut document = match extension.as_deref() {
            Some("json") => Self::from_json(&text)?,
            Some("yaml" | "yml") => Self::from_yaml(&text)?,
            _ => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default();
                crate::tokenizer::tokenize_markdown(stem, &text)
            }
        };
        if document.source_file.is_none() {
            document.source_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string);
        }
        Ok(document)
    }
}
