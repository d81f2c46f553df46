//! Cross-document modification history.
//!
//! Every parsed document lists the acts it amends in `references.amends`.
//! Linking turns those declarations into `modified_by` records on the amended
//! document and `modifies` records on the amending one. The index is built
//! once from a read-only snapshot of the corpus; linking never parses text.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{ModificationRecord, ParsedDocument};

/// Declaration that could not be linked because its target is not in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedAmendment {
    pub source_dossier: String,
    pub target_dossier: String,
}

/// What the linking pass could not turn into edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    pub unresolved: Vec<UnresolvedAmendment>,
    /// Documents declaring that they amend themselves.
    pub self_references: Vec<String>,
    /// Dossier numbers held by more than one document. Only the first one is
    /// linked; later copies get no records and their declarations are ignored.
    pub duplicate_dossiers: Vec<String>,
}

impl LinkReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
            && self.self_references.is_empty()
            && self.duplicate_dossiers.is_empty()
    }
}

/// Summary of a document as seen from the other side of an edge.
struct Counterpart<'a> {
    dossier_number: &'a str,
    publication_date: Option<&'a String>,
    url: Option<&'a String>,
    title: Option<&'a String>,
}

impl<'a> Counterpart<'a> {
    fn of(document: &'a ParsedDocument) -> Self {
        let metadata = &document.document_metadata;
        Self {
            dossier_number: &metadata.dossier_number,
            publication_date: metadata.publication_date.as_ref(),
            url: metadata.official_justel_url.as_ref(),
            title: metadata.title.as_ref(),
        }
    }
}

/// Merge repeated declarations for the same target, keeping first-seen order.
fn merged_declarations(document: &ParsedDocument) -> Vec<(&str, Vec<String>)> {
    let mut merged: Vec<(&str, Vec<String>)> = Vec::new();
    for declaration in &document.references.amends {
        let target = declaration.dossier_number.trim();
        let index = match merged.iter().position(|(t, _)| *t == target) {
            Some(index) => index,
            None => {
                merged.push((target, Vec::new()));
                merged.len() - 1
            }
        };
        let articles = &mut merged[index].1;
        for article in &declaration.modified_articles {
            if !articles.contains(article) {
                articles.push(article.clone());
            }
        }
    }
    merged
}

/// Sort key: dated records first by date, then dossier number.
fn record_order(record: &ModificationRecord) -> (bool, Option<String>, String) {
    (
        record.publication_date.is_none(),
        record.publication_date.clone(),
        record.dossier_number.clone(),
    )
}

/// Incoming and outgoing modification records keyed by dossier number.
#[derive(Debug, Clone, Default)]
pub struct AmendmentIndex {
    incoming: HashMap<String, Vec<ModificationRecord>>,
    outgoing: HashMap<String, Vec<ModificationRecord>>,
    report: LinkReport,
}

impl AmendmentIndex {
    /// Build the index from every document's declarations.
    #[must_use]
    pub fn build(documents: &[ParsedDocument]) -> Self {
        let mut index = Self::default();

        let mut by_dossier: HashMap<&str, &ParsedDocument> = HashMap::new();
        let mut linked = Vec::with_capacity(documents.len());
        for document in documents {
            let dossier = document.dossier_number();
            if by_dossier.contains_key(dossier) {
                tracing::warn!(dossier = %dossier, "dossier number appears in more than one document");
                if !index.report.duplicate_dossiers.iter().any(|d| d == dossier) {
                    index.report.duplicate_dossiers.push(dossier.to_string());
                }
                continue;
            }
            by_dossier.insert(dossier, document);
            linked.push(document);
        }

        for document in linked {
            let source = Counterpart::of(document);
            for (target_dossier, articles) in merged_declarations(document) {
                if target_dossier == source.dossier_number {
                    tracing::warn!(dossier = %target_dossier, "document declares an amendment of itself");
                    index.report.self_references.push(target_dossier.to_string());
                    continue;
                }
                let Some(target_document) = by_dossier.get(target_dossier) else {
                    tracing::debug!(
                        source = %source.dossier_number,
                        target = %target_dossier,
                        "amended act not in corpus"
                    );
                    index.report.unresolved.push(UnresolvedAmendment {
                        source_dossier: source.dossier_number.to_string(),
                        target_dossier: target_dossier.to_string(),
                    });
                    continue;
                };
                let target = Counterpart::of(target_document);

                index
                    .incoming
                    .entry(target.dossier_number.to_string())
                    .or_default()
                    .push(ModificationRecord {
                        dossier_number: source.dossier_number.to_string(),
                        publication_date: source.publication_date.cloned(),
                        modified_articles: articles.clone(),
                        source_url: source.url.cloned(),
                        full_title: source.title.cloned(),
                    });
                index
                    .outgoing
                    .entry(source.dossier_number.to_string())
                    .or_default()
                    .push(ModificationRecord {
                        dossier_number: target.dossier_number.to_string(),
                        publication_date: source.publication_date.cloned(),
                        modified_articles: articles,
                        source_url: target.url.cloned(),
                        full_title: target.title.cloned(),
                    });
            }
        }

        for records in index.incoming.values_mut().chain(index.outgoing.values_mut()) {
            records.sort_by_cached_key(record_order);
        }
        index
    }

    /// Amendments received by `dossier_number`, oldest first.
    #[must_use]
    pub fn modified_by(&self, dossier_number: &str) -> &[ModificationRecord] {
        self.incoming.get(dossier_number).map_or(&[], Vec::as_slice)
    }

    /// Amendments made by `dossier_number`, oldest first.
    #[must_use]
    pub fn modifies(&self, dossier_number: &str) -> &[ModificationRecord] {
        self.outgoing.get(dossier_number).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn report(&self) -> &LinkReport {
        &self.report
    }
}

/// Link a whole corpus.
///
/// Linked lists are rebuilt from scratch, so linking already-linked documents
/// gives the same result.
#[must_use]
pub fn link_documents(mut documents: Vec<ParsedDocument>) -> (Vec<ParsedDocument>, LinkReport) {
    let index = AmendmentIndex::build(&documents);
    let mut seen = HashSet::new();
    for document in &mut documents {
        let dossier = document.dossier_number().to_string();
        if seen.insert(dossier.clone()) {
            document.references.modified_by = index.modified_by(&dossier).to_vec();
            document.references.modifies = index.modifies(&dossier).to_vec();
        } else {
            document.references.modified_by.clear();
            document.references.modifies.clear();
        }
    }

    let edges: usize = documents.iter().map(|d| d.references.modifies.len()).sum();
    tracing::info!(documents = documents.len(), edges, "linked modification history");
    (documents, index.report)
}
