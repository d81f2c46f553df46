//! Gazette markdown tokenizer.
//!
//! Turns the intermediate markdown of a consolidated text into a
//! `SourceDocument`: metadata fields, the dated title, the preamble, and the
//! flat stream of heading and article events of the text section.

use regex::Regex;
use std::sync::LazyLock;

use crate::citation::normalize_date;
use crate::config::validate_dossier_number;
use crate::source::{SourceDocument, SourceEvent, SourceMetadata};
use crate::types::NodeKind;

/// `## Name` section header, optionally wrapped in `[3A]`-style markers.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\[\d+[A-Z]\]\s*)*#{2,}\s*(.+?)(?:\s*\[\d+[A-Z]\])*\s*$").expect("valid regex")
});

/// `**Label:** value` metadata field; several may share a line.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static METADATA_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*\s*([^*:]+?)\s*:\s*\*\*\s*([^*\n]*)").expect("valid regex")
});

/// `22 DECEMBRE 2008. - Loi portant ...`
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}(?:er)?\s+\p{L}+\s+\d{4})\.\s*-\s*(.+)$").expect("valid regex")
});

/// `**TITLE**[CHAPITRE II] \- Dispositions générales`
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*TITLE\*\*\[([^\]]+)\]\s*(?:\\?-\s*(.*?)|\[1\s*\\?-?\s*(.*?)\]1)?\s*$")
        .expect("valid regex")
});

/// `**ANNEXE**[ANNEXE 2] \- Liste des communes`
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ANNEXE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*ANNEXE\*\*\[([^\]]+)\]\s*(?:\\?-\s*)?(.*?)\s*$").expect("valid regex")
});

/// `**ARTICLE**[Art.] [1er].` and `**TITLE**[}Art.] [37]. (REGION WALLONNE)`
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKED_ARTICLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*(?:ARTICLE|TITLE)\*\*\s*\[?\}?(?i:art(?:icle)?)\.?\]?\s*(.+)$")
        .expect("valid regex")
});

/// Plain `Art. 3. Texte`
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PLAIN_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Art\.\s*(.+)$").expect("valid regex"));

/// Article number, optional region and the start of the body.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:\[(?P<bracketed>[^\]]+)\]\\?\.?",
        r"|(?P<bare>\d+(?:\.\d+)*(?:/\d+)?\p{L}*|[A-Z]+\d*)\\?\.)",
        r"\s*(?:\((?i:r[ée]gion)\s+(?i:de\s+)?(?P<region>[^)]+)\))?",
        r"\s*(?P<rest>.*)$",
    ))
    .expect("valid regex")
});

/// `(abrogé) <Abrogé par ...>` notice replacing the whole text.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ABROGATION_NOTICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?(?i:abrog[ée])\)?\s*<.+>\s*$").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static JUSTEL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(https://www\.ejustice\.just\.fgov\.be/eli/[^>\s]+)>").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PUBLICATION_PDF_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[Image de la publication officielle\]\((https://[^)\s]+)\)").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CONSOLIDATED_PDF_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[PDF version consolid[ée]e\]\((https://[^)\s]+)\)").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static COMPACT_DOSSIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})(\d{2,})$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Front,
    Preamble,
    Text,
    Other,
}

/// An article being collected.
struct OpenArticle {
    number: String,
    line: usize,
    body: Vec<String>,
}

impl OpenArticle {
    fn into_event(self) -> SourceEvent {
        SourceEvent::article(self.number, self.body.join("\n").trim().to_string()).at_line(self.line)
    }
}

/// Expand a compact dossier number (`2016011517`) to `2016-01-15/17`.
fn expand_dossier_number(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if validate_dossier_number(raw).is_ok() {
        return Some(raw.to_string());
    }
    let caps = COMPACT_DOSSIER.captures(raw)?;
    let sequence: u32 = caps[4].parse().ok()?;
    Some(format!("{}-{}-{}/{sequence}", &caps[1], &caps[2], &caps[3]))
}

fn set_metadata_field(metadata: &mut SourceMetadata, dossier: &mut Option<String>, label: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    let label = label.replace("&eacute;", "é").to_lowercase();
    let text = Some(value.to_string());
    if label.starts_with("dossier") {
        *dossier = expand_dossier_number(value);
    } else if label.starts_with("numéro") || label.starts_with("numero") {
        metadata.document_number = text;
    } else if label.starts_with("publication") {
        metadata.publication_date = normalize_date(value);
    } else if label.starts_with("page") {
        metadata.page_number = text;
    } else if label.starts_with("source") {
        metadata.source = text;
    } else if label.contains("en vigueur") {
        metadata.effective_date = normalize_date(value);
    } else if label.starts_with("fin de validit") {
        metadata.end_validity_date = normalize_date(value);
    }
}

/// Split an article start (`[37]. (REGION WALLONNE) Texte`) into number and body start.
fn parse_article_start(rest: &str) -> Option<(String, String)> {
    let caps = ARTICLE_NUMBER.captures(rest.trim())?;
    let number = caps
        .name("bracketed")
        .or_else(|| caps.name("bare"))?
        .as_str()
        .trim()
        .trim_end_matches(['.', '\\'])
        .to_string();
    let number = match caps.name("region") {
        Some(region) => format!("{number} {}", region.as_str().trim().to_uppercase()),
        None => number,
    };
    let body = caps.name("rest").map_or("", |m| m.as_str()).trim().to_string();
    Some((number, body))
}

fn article_start(line: &str) -> Option<(String, String)> {
    if let Some(caps) = MARKED_ARTICLE.captures(line) {
        return parse_article_start(&caps[1]);
    }
    let caps = PLAIN_ARTICLE.captures(line)?;
    let rest = caps[1].trim_start();
    // Plain "Art." lines only open an article when followed by a number.
    if !rest.starts_with(|c: char| c.is_ascii_digit() || c == '[') {
        return None;
    }
    parse_article_start(rest)
}

fn heading_event(line: &str) -> Option<SourceEvent> {
    if let Some(caps) = ANNEXE_LINE.captures(line) {
        return Some(SourceEvent::Heading {
            kind: Some(NodeKind::Annexe),
            title_type: caps[1].trim().to_string(),
            title_content: caps[2].trim().to_string(),
            rank: None,
            line: None,
        });
    }
    let caps = HEADING_LINE.captures(line)?;
    let content = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map_or("", |m| m.as_str());
    Some(SourceEvent::heading(caps[1].trim(), content.trim()))
}

/// Tokenize gazette markdown.
///
/// `dossier_fallback` is used when the content carries no dossier number;
/// a compact ten-digit form is expanded.
#[must_use]
pub fn tokenize_markdown(dossier_fallback: &str, content: &str) -> SourceDocument {
    let mut metadata = SourceMetadata::default();
    let mut dossier: Option<String> = None;
    let mut preamble: Vec<&str> = Vec::new();
    let mut abrogation_text: Option<String> = None;
    let mut events = Vec::new();
    let mut open: Option<OpenArticle> = None;
    let mut section = Section::Front;

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();

        if let Some(caps) = SECTION_HEADER.captures(line) {
            if let Some(article) = open.take() {
                events.push(article.into_event());
            }
            let name = caps[1].to_lowercase();
            section = if name.starts_with("texte") {
                Section::Text
            } else if name.starts_with("préambule") || name.starts_with("preambule") {
                Section::Preamble
            } else {
                Section::Other
            };
            continue;
        }

        match section {
            Section::Preamble => {
                if !line.is_empty() {
                    preamble.push(line);
                }
                continue;
            }
            Section::Front | Section::Other => {
                for caps in METADATA_FIELD.captures_iter(line) {
                    set_metadata_field(&mut metadata, &mut dossier, &caps[1], &caps[2]);
                }
                if metadata.title.is_none() && TITLE_LINE.is_match(line) {
                    metadata.title = Some(line.to_string());
                }
                if section == Section::Other {
                    continue;
                }
                // Documents without a "## Texte" header start their text at
                // the first structural line.
                if article_start(line).is_none() && heading_event(line).is_none() {
                    continue;
                }
                section = Section::Text;
            }
            Section::Text => {}
        }

        if let Some((number, body)) = article_start(line) {
            if let Some(article) = open.take() {
                events.push(article.into_event());
            }
            open = Some(OpenArticle {
                number,
                line: line_number,
                body: if body.is_empty() { Vec::new() } else { vec![body] },
            });
            continue;
        }

        if let Some(event) = heading_event(line) {
            if let Some(article) = open.take() {
                events.push(article.into_event());
            }
            events.push(event.at_line(line_number));
            continue;
        }

        match open.as_mut() {
            Some(article) => article.body.push(raw_line.trim_end().to_string()),
            None if ABROGATION_NOTICE.is_match(line) => {
                abrogation_text = Some(line.to_string());
            }
            None if !line.is_empty() => {
                tracing::debug!(line = line_number, "text outside any article ignored");
            }
            None => {}
        }
    }
    if let Some(article) = open.take() {
        events.push(article.into_event());
    }

    metadata.justel_url = JUSTEL_LINK.captures(content).map(|c| c[1].to_string());
    metadata.publication_pdf_url = PUBLICATION_PDF_LINK.captures(content).map(|c| c[1].to_string());
    metadata.consolidated_pdf_url = CONSOLIDATED_PDF_LINK.captures(content).map(|c| c[1].to_string());

    let dossier_number = dossier
        .or_else(|| expand_dossier_number(dossier_fallback))
        .unwrap_or_else(|| dossier_fallback.trim().to_string());

    tracing::debug!(dossier = %dossier_number, events = events.len(), "tokenized markdown");

    SourceDocument {
        dossier_number,
        metadata,
        preamble: (!preamble.is_empty()).then(|| preamble.join("\n")),
        abrogation_text,
        events,
        ..SourceDocument::default()
    }
}
