//! Hand-corrected replacement documents.
//!
//! Documents the automatic parse cannot handle (unmergeable duplicates,
//! provision drift) are fixed by a complete, manually authored
//! `ParsedDocument` keyed by dossier number. The table is consulted before
//! parsing; a hit is substituted verbatim.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::config::label_key;
use crate::error::{ParserError, Result};
use crate::types::{DocumentNode, NodeKind, ParsedDocument};

/// Replacement documents keyed by dossier number.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    documents: HashMap<String, ParsedDocument>,
}

fn invalid(document: &ParsedDocument, reason: String) -> ParserError {
    ParserError::InvalidOverride {
        dossier_number: document.dossier_number().to_string(),
        reason,
    }
}

fn validate_nodes(
    document: &ParsedDocument,
    nodes: &[DocumentNode],
    anchors: &mut HashSet<String>,
) -> Result<()> {
    let mut siblings: HashSet<(NodeKind, String)> = HashSet::new();
    for node in nodes {
        if node.kind != NodeKind::Article
            && !siblings.insert((node.kind, label_key(&node.label)))
        {
            return Err(invalid(
                document,
                format!("duplicate sibling {} '{}'", node.kind.as_str(), node.label),
            ));
        }

        match (&node.article_content, node.kind) {
            (Some(content), NodeKind::Article) => {
                if !anchors.insert(content.anchor_id.clone()) {
                    return Err(invalid(
                        document,
                        format!("duplicate anchor {}", content.anchor_id),
                    ));
                }
                if let Some(reference) = content
                    .footnote_references
                    .iter()
                    .find(|r| content.footnote(&r.reference_number).is_none())
                {
                    return Err(invalid(
                        document,
                        format!(
                            "footnote reference ({}) in {} has no footnote",
                            reference.reference_number, content.anchor_id
                        ),
                    ));
                }
                if !node.children.is_empty() {
                    return Err(invalid(
                        document,
                        format!("article {} has children", content.anchor_id),
                    ));
                }
            }
            (None, NodeKind::Article) => {
                return Err(invalid(document, format!("article '{}' has no content", node.label)));
            }
            (Some(_), _) => {
                return Err(invalid(
                    document,
                    format!("container '{}' carries article content", node.label),
                ));
            }
            (None, _) => {}
        }

        validate_nodes(document, &node.children, anchors)?;
    }
    Ok(())
}

/// Read a `ParsedDocument` from a `.json`, `.yaml` or `.yml` file.
///
/// Returns `None` for other extensions.
fn read_document(path: &Path) -> Result<Option<ParsedDocument>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let document = match extension.as_deref() {
        Some("json") => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        Some("yaml" | "yml") => serde_yaml_ng::from_str(&std::fs::read_to_string(path)?)?,
        _ => return Ok(None),
    };
    Ok(Some(document))
}

/// Load and validate a single replacement document.
pub fn load_override(path: &Path) -> Result<ParsedDocument> {
    let document = read_document(path)?.ok_or_else(|| {
        ParserError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a JSON or YAML file: {}", path.display()),
        ))
    })?;
    validate_override(&document)?;
    Ok(document)
}

/// Check a replacement document against the tree invariants.
///
/// Sibling containers must have unique (type, label) pairs, anchor ids must
/// be unique in the document, and every footnote reference must point to a
/// footnote of its own article.
pub fn validate_override(document: &ParsedDocument) -> Result<()> {
    if document.dossier_number().trim().is_empty() {
        return Err(invalid(document, "missing dossier number".to_string()));
    }
    validate_nodes(document, &document.document_hierarchy, &mut HashSet::new())
}

impl OverrideTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from documents, validating each one.
    pub fn from_documents(documents: impl IntoIterator<Item = ParsedDocument>) -> Result<Self> {
        let mut table = Self::new();
        for document in documents {
            table.insert(document)?;
        }
        Ok(table)
    }

    /// Add a validated replacement document.
    pub fn insert(&mut self, document: ParsedDocument) -> Result<()> {
        validate_override(&document)?;
        let dossier = document.dossier_number().to_string();
        if self.documents.contains_key(&dossier) {
            return Err(ParserError::DuplicateOverride(dossier));
        }
        self.documents.insert(dossier, document);
        Ok(())
    }

    /// Load every `*.json`, `*.yaml` and `*.yml` file of a directory.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut table = Self::new();
        for path in paths {
            let Some(document) = read_document(&path)? else {
                continue;
            };
            tracing::debug!(
                dossier = %document.dossier_number(),
                path = %path.display(),
                "loaded override"
            );
            table.insert(document)?;
        }
        tracing::info!(count = table.len(), dir = %dir.display(), "loaded override table");
        Ok(table)
    }

    #[must_use]
    pub fn get(&self, dossier_number: &str) -> Option<&ParsedDocument> {
        self.documents.get(dossier_number)
    }

    #[must_use]
    pub fn contains(&self, dossier_number: &str) -> bool {
        self.documents.contains_key(dossier_number)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
