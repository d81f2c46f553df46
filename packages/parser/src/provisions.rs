//! Numbered-provision extraction.
//!
//! Provisions are introduced by `1°`, `2°`, ... markers at clause boundaries
//! (start of text, start of a line, after `;` or `:`, or right after a `§ N.`
//! paragraph marker). Inside a provision,
//! lettered markers `a)`, `b)`, ... open sub-items, one level deep. Markers are
//! taken as they appear; numbering is neither checked nor deduplicated.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::Provision;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+°").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LETTERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]{1,2}\)").expect("valid regex"));

/// `§ 1er.`, `§ 2.`, `§ 3/1.`, `§ 4bis.` paragraph markers.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PARAGRAPH_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"§\s*(\d+(?:er|e)?(?:/\d+)?(?:bis|ter|quater|quinquies|sexies|septies|octies|novies|decies)?)\.")
        .expect("valid regex")
});

/// A `§` paragraph marker in the scanned text. Offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSpan {
    pub marker: String,
    pub start: usize,
    pub content_start: usize,
}

/// Locate paragraph markers that open a paragraph (start of text, start of a
/// line, or after `.`, `;` or `:`). A `§ 2.` inside a sentence is a
/// cross-reference and is skipped.
#[must_use]
pub fn scan_paragraphs(text: &str) -> Vec<ParagraphSpan> {
    PARAGRAPH_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let before = text[..whole.start()]
                .trim_end_matches([' ', '\t'])
                .chars()
                .next_back();
            let at_boundary = before.map_or(true, |c| matches!(c, '\n' | '\r' | '.' | ';' | ':'));
            at_boundary.then(|| ParagraphSpan {
                marker: caps[1].to_string(),
                start: whole.start(),
                content_start: whole.end(),
            })
        })
        .collect()
}

/// Location of a provision in the scanned text. Offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSpan {
    pub number: String,
    pub marker_start: usize,
    pub text_start: usize,
    pub end: usize,
    pub sub_items: Vec<ProvisionSpan>,
}

impl ProvisionSpan {
    /// End of the provision's own text, before its first sub-item.
    #[must_use]
    pub fn own_text_end(&self) -> usize {
        self.sub_items.first().map_or(self.end, |s| s.marker_start)
    }

    #[must_use]
    pub fn to_provision(&self, text: &str) -> Provision {
        Provision::new(
            self.number.clone(),
            clean_provision_text(&text[self.text_start..self.own_text_end()]),
        )
        .with_sub_items(self.sub_items.iter().map(|s| s.to_provision(text)).collect())
    }
}

/// Whether the marker at `start` sits at a clause boundary. `paragraph_ends`
/// holds the `content_start` of every paragraph marker in `text`.
fn at_clause_boundary(text: &str, start: usize, paragraph_ends: &[usize]) -> bool {
    let before = text[..start].trim_end_matches([' ', '\t']);
    match before.chars().next_back() {
        None => true,
        Some(c) => matches!(c, '\n' | '\r' | ';' | ':') || paragraph_ends.contains(&before.len()),
    }
}

/// Whether the character at byte `at` is whitespace or the end of `text`.
fn followed_by_space(text: &str, at: usize) -> bool {
    text[at..].chars().next().map_or(true, char::is_whitespace)
}

fn clean_provision_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches([';', ' ']).to_string()
}

/// Scan lettered sub-items in `text[start..end]`.
fn scan_sub_items(text: &str, start: usize, end: usize) -> Vec<ProvisionSpan> {
    let region = &text[start..end];
    let markers: Vec<(usize, usize)> = LETTERED_MARKER
        .find_iter(region)
        .filter(|m| {
            let preceded = region[..m.start()]
                .chars()
                .next_back()
                .map_or(true, char::is_whitespace);
            preceded && followed_by_space(region, m.end())
        })
        .map(|m| (start + m.start(), start + m.end()))
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(index, &(marker_start, marker_end))| ProvisionSpan {
            number: text[marker_start..marker_end].to_string(),
            marker_start,
            text_start: marker_end,
            end: markers.get(index + 1).map_or(end, |&(next, _)| next),
            sub_items: Vec::new(),
        })
        .collect()
}

/// Locate numbered provisions and their lettered sub-items.
#[must_use]
pub fn scan_provisions(text: &str) -> Vec<ProvisionSpan> {
    let paragraph_ends: Vec<usize> = scan_paragraphs(text)
        .iter()
        .map(|p| p.content_start)
        .collect();
    let markers: Vec<(usize, usize)> = NUMBERED_MARKER
        .find_iter(text)
        .filter(|m| {
            at_clause_boundary(text, m.start(), &paragraph_ends) && followed_by_space(text, m.end())
        })
        .map(|m| (m.start(), m.end()))
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(index, &(marker_start, marker_end))| {
            let end = markers.get(index + 1).map_or(text.len(), |&(next, _)| next);
            ProvisionSpan {
                number: text[marker_start..marker_end].to_string(),
                marker_start,
                text_start: marker_end,
                end,
                sub_items: scan_sub_items(text, marker_end, end),
            }
        })
        .collect()
}

/// Extract numbered provisions from de-bracketed text, in source order.
///
/// # Examples
/// ```
/// use justel_parser::provisions::extract_provisions;
///
/// let provisions = extract_provisions("1° premier point a) sous-point; b) second sous-point; 2° second point");
/// assert_eq!(provisions.len(), 2);
/// assert_eq!(provisions[0].sub_items.len(), 2);
/// ```
#[must_use]
pub fn extract_provisions(text: &str) -> Vec<Provision> {
    scan_provisions(text)
        .iter()
        .map(|span| span.to_provision(text))
        .collect()
}

/// Number of provisions including sub-items.
#[must_use]
pub fn count_provisions(provisions: &[Provision]) -> usize {
    provisions
        .iter()
        .map(|p| 1 + count_provisions(&p.sub_items))
        .sum()
}
