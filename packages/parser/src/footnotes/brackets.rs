//! Bracket-span resolution.
//!
//! Amended passages are wrapped as `[<id> <text>]<id>`, possibly nested.
//! Resolution removes the markup and records one `FootnoteReference` per
//! span, with offsets counted in characters of the de-bracketed output.

use std::cmp::Reverse;

use crate::error::{ParserError, Result};
use crate::types::FootnoteReference;

/// De-bracketed text with the spans found in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedText {
    pub text: String,
    /// Sorted by start offset, enclosing spans before the spans they contain.
    pub references: Vec<FootnoteReference>,
}

/// A span opened but not yet closed.
struct OpenSpan {
    id: String,
    output_start: usize,
    raw_start: usize,
    raw_offset: usize,
}

/// Length in chars of the run of ASCII digits starting at `from`.
fn digits_at(chars: &[(usize, char)], from: usize) -> usize {
    chars[from..]
        .iter()
        .take_while(|(_, c)| c.is_ascii_digit())
        .count()
}

fn collect_id(chars: &[(usize, char)], from: usize, len: usize) -> String {
    chars[from..from + len].iter().map(|(_, c)| *c).collect()
}

/// Opener `[<digits><whitespace>` at `i`: returns the id and the markup length.
fn opener_at(chars: &[(usize, char)], i: usize) -> Option<(String, usize)> {
    let len = digits_at(chars, i + 1);
    if len == 0 {
        return None;
    }
    let after = chars.get(i + 1 + len).map(|(_, c)| *c)?;
    after
        .is_whitespace()
        .then(|| (collect_id(chars, i + 1, len), len + 2))
}

/// Closer `]<digits>` at `i`: returns the id and the markup length.
fn closer_at(chars: &[(usize, char)], i: usize) -> Option<(String, usize)> {
    let len = digits_at(chars, i + 1);
    (len > 0).then(|| (collect_id(chars, i + 1, len), len + 1))
}

/// Resolve all bracket spans of an article text.
///
/// Fails with `BracketMismatch` on a closer whose id differs from the
/// innermost open span (or with no open span), and on spans left open at the
/// end of the text. The offset is the character offset in `raw` of the
/// offending closer or of the unclosed opener.
///
/// # Examples
/// ```
/// use justel_parser::footnotes::resolve_brackets;
///
/// let resolved = resolve_brackets("Le [1 nouveau]1 texte.").unwrap();
/// assert_eq!(resolved.text, "Le nouveau texte.");
/// assert_eq!(resolved.references[0].text_position, 3);
/// assert_eq!(resolved.references[0].referenced_text, "nouveau");
///
/// assert!(resolve_brackets("[1 texte]2").is_err());
/// ```
pub fn resolve_brackets(raw: &str) -> Result<ResolvedText> {
    let chars: Vec<(usize, char)> = raw.char_indices().collect();
    let mut text = String::with_capacity(raw.len());
    let mut out_len = 0usize;
    let mut stack: Vec<OpenSpan> = Vec::new();
    let mut references = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        let (byte, c) = chars[i];

        if c == '[' {
            if let Some((id, consumed)) = opener_at(&chars, i) {
                stack.push(OpenSpan {
                    id,
                    output_start: out_len,
                    raw_start: byte,
                    raw_offset: i,
                });
                i += consumed;
                continue;
            }
        }

        if c == ']' {
            if let Some((id, consumed)) = closer_at(&chars, i) {
                let open = match stack.pop() {
                    Some(open) if open.id == id => open,
                    other => {
                        return Err(ParserError::BracketMismatch {
                            offset: i,
                            expected: other.map(|open| open.id),
                            found: Some(id),
                        });
                    }
                };
                let raw_end = chars.get(i + consumed).map_or(raw.len(), |(b, _)| *b);
                let referenced_text: String =
                    text.chars().skip(open.output_start).collect();
                references.push(FootnoteReference {
                    reference_number: open.id,
                    text_position: open.output_start,
                    referenced_text,
                    bracket_pattern: raw[open.raw_start..raw_end].to_string(),
                    law_reference: None,
                });
                i += consumed;
                continue;
            }
        }

        text.push(c);
        out_len += 1;
        i += 1;
    }

    if let Some(open) = stack.pop() {
        return Err(ParserError::BracketMismatch {
            offset: open.raw_offset,
            expected: Some(open.id),
            found: None,
        });
    }

    references.sort_by_key(|r| (r.text_position, Reverse(r.end_position())));
    Ok(ResolvedText { text, references })
}
