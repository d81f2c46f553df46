//! Per-article footnote tables.

use regex::Regex;
use std::sync::LazyLock;

use crate::citation::scan_citation;
use crate::config::{article_url, dossier_url};
use crate::error::ParserError;
use crate::types::{Footnote, FootnoteReference};

/// Separator between an article's text and its footnotes (`\-----` in the markdown).
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FOOTNOTE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\\-{5,}|^[ \t]*-{5,}[ \t]*$").expect("valid regex")
});

/// Footnote entry marker `(n)` at the start of a line or after whitespace or `>`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ENTRY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|[\s>])(\((\d+)\))").expect("valid regex"));

/// Footnotes of one article, plus the entries whose citation could not be parsed.
#[derive(Debug, Default)]
pub struct FootnoteTable {
    pub footnotes: Vec<Footnote>,
    pub failures: Vec<ParserError>,
}

/// Split an article body into its main text and its footnote section.
///
/// # Examples
/// ```
/// use justel_parser::footnotes::split_footnote_section;
///
/// let (main, notes) = split_footnote_section("Texte [1 neuf]1.\n\\-----\n(1)<L 2008-12-22/33>");
/// assert_eq!(main, "Texte [1 neuf]1.");
/// assert_eq!(notes, Some("(1)<L 2008-12-22/33>"));
/// ```
#[must_use]
pub fn split_footnote_section(body: &str) -> (&str, Option<&str>) {
    match FOOTNOTE_SEPARATOR.find(body) {
        Some(m) => (body[..m.start()].trim(), Some(body[m.end()..].trim())),
        None => (body.trim(), None),
    }
}

/// Build one footnote from its number and raw entry.
///
/// Unparseable entries are kept with their raw text and no citation.
#[must_use]
pub fn build_footnote(number: &str, content: &str) -> (Footnote, Option<ParserError>) {
    let Some(found) = scan_citation(content) else {
        let footnote = Footnote {
            footnote_number: number.to_string(),
            footnote_content: content.to_string(),
            law_reference: None,
            effective_date: None,
            modification_type: None,
            direct_url: None,
            direct_article_url: None,
        };
        return (footnote, Some(ParserError::CitationParse(content.to_string())));
    };

    let citation = found.citation;
    let direct_url = citation
        .url
        .clone()
        .or_else(|| dossier_url(&citation.dossier_number));
    let direct_article_url = direct_url
        .as_deref()
        .zip(citation.article_number.as_deref())
        .map(|(url, article)| article_url(url, article));

    let footnote = Footnote {
        footnote_number: number.to_string(),
        footnote_content: content.to_string(),
        effective_date: citation.effective_date.clone(),
        modification_type: Some(found.modification_type),
        direct_url,
        direct_article_url,
        law_reference: Some(citation),
    };
    (footnote, None)
}

/// Parse a footnote section into a table.
pub fn parse_footnote_section(section: &str) -> FootnoteTable {
    let markers: Vec<(usize, String)> = ENTRY_MARKER
        .captures_iter(section)
        .filter_map(|caps| Some((caps.get(1)?.start(), caps.get(2)?.as_str().to_string())))
        .collect();

    let mut table = FootnoteTable::default();
    for (index, (start, number)) in markers.iter().enumerate() {
        let end = markers
            .get(index + 1)
            .map_or(section.len(), |(next, _)| *next);
        let content = section[*start..end].trim();

        if table.footnotes.iter().any(|f| &f.footnote_number == number) {
            tracing::debug!(footnote = %number, "repeated footnote number, keeping the first entry");
            continue;
        }

        let (footnote, failure) = build_footnote(number, content);
        if let Some(err) = failure {
            tracing::debug!(footnote = %number, error = %err, "footnote kept without citation");
            table.failures.push(err);
        }
        table.footnotes.push(footnote);
    }
    table
}

/// Attach footnote citations to references and report ids missing from the table.
pub fn link_references(
    references: &mut [FootnoteReference],
    footnotes: &[Footnote],
    anchor_id: &str,
) -> Vec<ParserError> {
    let mut dangling = Vec::new();
    for reference in references.iter_mut() {
        match footnotes
            .iter()
            .find(|f| f.footnote_number == reference.reference_number)
        {
            Some(footnote) => reference.law_reference = footnote.law_reference.clone(),
            None => {
                tracing::warn!(
                    anchor = %anchor_id,
                    footnote = %reference.reference_number,
                    "dangling footnote reference"
                );
                dangling.push(ParserError::DanglingFootnoteReference {
                    anchor_id: anchor_id.to_string(),
                    reference_number: reference.reference_number.clone(),
                });
            }
        }
    }
    dangling
}
