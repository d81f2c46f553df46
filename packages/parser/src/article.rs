//! Assembly of one article from its raw body.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::{anchor_id, ABROGATION_SCAN_WINDOW};
use crate::error::ParserError;
use crate::footnotes::{link_references, parse_footnote_section, resolve_brackets, split_footnote_section};
use crate::html::{find_paragraphs, has_tables, render_article};
use crate::provisions::{count_provisions, extract_provisions};
use crate::types::{ArticleContent, ExtractionIssue, IssueKind, StructuredContentMetadata};

/// Repeal marker: `[abrogé]`, `(Abrogé)`, `<Abrogé par ...>` or the bare word.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ABROGATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\babrog[ée]\b").expect("valid regex"));

/// Status recorded on repealed articles.
pub const ABROGATED_STATUS: &str = "abrogé";

/// An article together with the non-fatal problems found while building it.
#[derive(Debug, Clone)]
pub struct AssembledArticle {
    pub content: ArticleContent,
    pub issues: Vec<ExtractionIssue>,
}

fn issue_from(err: &ParserError, anchor: &str) -> ExtractionIssue {
    let kind = match err {
        ParserError::BracketMismatch { .. } => IssueKind::BracketMismatch,
        ParserError::DanglingFootnoteReference { .. } => IssueKind::DanglingFootnoteReference,
        _ => IssueKind::CitationParse,
    };
    ExtractionIssue::new(kind, anchor, err.to_string())
}

/// Whether the opening of an article marks it as repealed.
#[must_use]
pub fn detect_abrogation(text: &str) -> Option<String> {
    let window: String = text.chars().take(ABROGATION_SCAN_WINDOW).collect();
    ABROGATION_MARKER
        .is_match(&window)
        .then(|| ABROGATED_STATUS.to_string())
}

/// Build an article from its number and raw body (footnote section included).
///
/// Bracket mismatches keep the raw text and set `bracket_resolution_skipped`;
/// they never fail the article.
#[must_use]
pub fn assemble_article(number: &str, body: &str, generated_at: &str) -> AssembledArticle {
    let number = number.trim();
    let anchor = anchor_id(number);
    let mut issues = Vec::new();

    let (main, notes) = split_footnote_section(body);
    let table = notes.map(parse_footnote_section).unwrap_or_default();
    issues.extend(table.failures.iter().map(|err| issue_from(err, &anchor)));

    let (main_text_raw, mut references, skipped) = match resolve_brackets(main) {
        Ok(resolved) => (resolved.text, resolved.references, false),
        Err(err) => {
            tracing::warn!(anchor = %anchor, error = %err, "bracket resolution skipped");
            issues.push(issue_from(&err, &anchor));
            (main.to_string(), Vec::new(), true)
        }
    };

    let dangling = link_references(&mut references, &table.footnotes, &anchor);
    issues.extend(dangling.iter().map(|err| issue_from(err, &anchor)));

    let numbered_provisions = extract_provisions(&main_text_raw);
    let structured_content_metadata = StructuredContentMetadata {
        paragraph_count: find_paragraphs(&main_text_raw).len(),
        provision_count: count_provisions(&numbered_provisions),
        has_tables: has_tables(&main_text_raw),
        generation_timestamp: generated_at.to_string(),
    };

    let mut content = ArticleContent {
        article_number: number.to_string(),
        anchor_id: anchor,
        abrogation_status: detect_abrogation(main),
        main_text_raw,
        main_text: String::new(),
        numbered_provisions,
        footnotes: table.footnotes,
        footnote_references: references,
        bracket_resolution_skipped: skipped,
        structured_content_metadata,
    };
    content.main_text = render_article(&content);

    AssembledArticle { content, issues }
}
