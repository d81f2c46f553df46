//! Per-document driver.
//!
//! Runs a source document through the hierarchy builder (which assembles
//! each article) and fills in metadata, abrogation info, statistics and
//! completeness flags.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::citation::find_citations;
use crate::config::{dossier_url, DEFAULT_LANGUAGE};
use crate::error::Result;
use crate::hierarchy::{build_hierarchy, create_belgian_heading_grammar, HeadingGrammar};
use crate::overrides::OverrideTable;
use crate::provisions::count_provisions;
use crate::source::SourceDocument;
use crate::types::{
    AbrogationInfo, CompletenessFlags, DocumentMetadata, DocumentStatus, DocumentType,
    ExtractionIssue, ExtractionMetadata, ExtractionStatistics, IssueKind, ParsedDocument,
    References,
};

/// Version string recorded in extraction metadata.
pub const PARSER_VERSION: &str = concat!("justel-parser ", env!("CARGO_PKG_VERSION"));

/// Options shared by every document of a run.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Timestamp written to `extraction_date` and `generation_timestamp`.
    pub generated_at: DateTime<Utc>,
    pub grammar: HeadingGrammar,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            grammar: create_belgian_heading_grammar(),
        }
    }

    #[must_use]
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    #[must_use]
    pub fn with_grammar(mut self, grammar: HeadingGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    fn timestamp(&self) -> String {
        self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

fn build_metadata(source: &SourceDocument, abrogated: bool) -> DocumentMetadata {
    let meta = &source.metadata;
    DocumentMetadata {
        document_number: meta.document_number.clone(),
        dossier_number: source.dossier_number.clone(),
        title: meta.title.clone(),
        publication_date: meta.publication_date.clone(),
        source: meta.source.clone(),
        page_number: meta.page_number.clone(),
        effective_date: meta.effective_date.clone(),
        end_validity_date: meta.end_validity_date.clone(),
        language: DEFAULT_LANGUAGE.to_string(),
        document_type: meta.title.as_deref().and_then(DocumentType::from_title),
        status: if abrogated {
            DocumentStatus::Abrogated
        } else {
            DocumentStatus::Active
        },
        official_justel_url: meta
            .justel_url
            .clone()
            .or_else(|| dossier_url(&source.dossier_number)),
        official_publication_pdf_url: meta.publication_pdf_url.clone(),
        consolidated_pdf_url: meta.consolidated_pdf_url.clone(),
    }
}

fn build_abrogation_info(source: &SourceDocument) -> Option<AbrogationInfo> {
    let text = source.abrogation_text.as_ref()?;
    let citation = find_citations(text).into_iter().next();
    Some(AbrogationInfo {
        is_fully_abrogated: true,
        abrogation_text: Some(text.clone()),
        abrogation_date: citation
            .as_ref()
            .and_then(|c| c.effective_date.clone())
            .or_else(|| source.metadata.end_validity_date.clone()),
        abrogating_citation: citation,
    })
}

/// Parse one source document.
///
/// Fails only on document-scoped errors (`StructuralConflict`); article and
/// footnote problems are recorded in `extraction_metadata.issues`.
pub fn parse_document(source: &SourceDocument, options: &ParseOptions) -> Result<ParsedDocument> {
    let timestamp = options.timestamp();
    let hierarchy = build_hierarchy(&source.events, &options.grammar, &timestamp)?;

    let abrogation_info = build_abrogation_info(source);
    let abrogated = abrogation_info.is_some() || source.metadata.end_validity_date.is_some();
    let document_metadata = build_metadata(source, abrogated);

    let mut statistics = ExtractionStatistics::default();
    for article in crate::types::forest_articles(&hierarchy.nodes) {
        statistics.article_count += 1;
        statistics.footnote_count += article.footnotes.len();
        statistics.footnote_reference_count += article.footnote_references.len();
        statistics.provision_count += count_provisions(&article.numbered_provisions);
    }

    let has_issue = |kind: IssueKind| hierarchy.issues.iter().any(|i| i.kind == kind);
    let completeness_flags = CompletenessFlags {
        all_articles_extracted: statistics.article_count > 0 || abrogated,
        footnotes_linked: !has_issue(IssueKind::DanglingFootnoteReference),
        citations_parsed: !has_issue(IssueKind::CitationParse),
        bracket_spans_resolved: !has_issue(IssueKind::BracketMismatch),
        hierarchical_structure_complete: true,
        metadata_complete: document_metadata.title.is_some()
            && document_metadata.publication_date.is_some(),
        preamble_extracted: source.preamble.is_some(),
        is_minimal_document: statistics.article_count == 0,
        is_abrogated_document: abrogated,
        is_manual_override: false,
    };

    if !hierarchy.issues.is_empty() {
        tracing::warn!(
            dossier = %source.dossier_number,
            issues = hierarchy.issues.len(),
            "document parsed with issues"
        );
    }
    tracing::debug!(
        dossier = %source.dossier_number,
        articles = statistics.article_count,
        footnotes = statistics.footnote_count,
        "parsed document"
    );

    Ok(ParsedDocument {
        document_metadata,
        preamble: source.preamble.clone(),
        abrogation_info,
        document_hierarchy: hierarchy.nodes,
        references: References {
            amends: source.amends.clone(),
            ..References::default()
        },
        external_links: source.external_links.clone(),
        extraction_metadata: ExtractionMetadata {
            extraction_date: timestamp,
            source_file: source.source_file.clone(),
            parser_version: PARSER_VERSION.to_string(),
            statistics,
            completeness_flags,
            issues: hierarchy.issues,
        },
    })
}

/// Parse a document, substituting its hand-corrected replacement when one exists.
pub fn process_document(
    source: &SourceDocument,
    overrides: &OverrideTable,
    options: &ParseOptions,
) -> Result<ParsedDocument> {
    if let Some(replacement) = overrides.get(&source.dossier_number) {
        tracing::info!(dossier = %source.dossier_number, "using manual override");
        let mut document = replacement.clone();
        document.extraction_metadata.completeness_flags.is_manual_override = true;
        if document.references.amends.is_empty() {
            document.references.amends = source.amends.clone();
        }
        return Ok(document);
    }

    parse_document(source, options).inspect_err(|err| {
        if err.is_document_scoped() {
            tracing::warn!(
                dossier = %source.dossier_number,
                error = %err,
                "automatic parse needs a manual override"
            );
        }
    })
}

/// Issues of one kind, for reporting.
#[must_use]
pub fn issues_of_kind(document: &ParsedDocument, kind: IssueKind) -> Vec<&ExtractionIssue> {
    document
        .extraction_metadata
        .issues
        .iter()
        .filter(|i| i.kind == kind)
        .collect()
}
