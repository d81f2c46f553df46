//! Deterministic HTML rendering of article content.
//!
//! The output only depends on the `ArticleContent` passed in: no clock, no
//! hash-map iteration order. Re-rendering the same article always yields the
//! same bytes.
//!
//! Template:
//!
//! ```text
//! <article class="legal-article" id="{anchor}" data-article-number="{number}">
//!   <header class="article-header"><h2 class="article-number">Art. {number}</h2>[status]</header>
//!   <div class="article-content">
//!     <section class="paragraph" id="{anchor}-para-{marker}">...</section>   (one per §)
//!     or <div class="article-text">...</div>                              (no §)
//!   </div>
//!   [<footer class="article-footnotes"><ol class="footnotes">...</ol></footer>]
//! </article>
//! ```

use crate::provisions::{scan_paragraphs, scan_provisions, ProvisionSpan};
use crate::types::{ArticleContent, FootnoteReference};

/// A `§` paragraph marker, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphMarker {
    pub marker: String,
    pub start: usize,
    pub content_start: usize,
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Locate paragraph markers that open a paragraph, in character offsets.
#[must_use]
pub fn find_paragraphs(text: &str) -> Vec<ParagraphMarker> {
    scan_paragraphs(text)
        .into_iter()
        .map(|span| ParagraphMarker {
            marker: span.marker,
            start: char_offset(text, span.start),
            content_start: char_offset(text, span.content_start),
        })
        .collect()
}

/// Whether the text contains a markdown table row.
#[must_use]
pub fn has_tables(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim();
        line.len() > 1 && line.starts_with('|') && line.ends_with('|')
    })
}

fn escape_into(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\n' => out.push_str("<br>"),
        '\r' => {}
        c => out.push(c),
    }
}

/// Escape text for use in element content and double-quoted attributes.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | '\r' => out.push(c),
            c => escape_into(&mut out, c),
        }
    }
    out
}

struct Renderer<'a> {
    content: &'a ArticleContent,
    chars: Vec<char>,
    out: String,
}

impl<'a> Renderer<'a> {
    fn new(content: &'a ArticleContent) -> Self {
        Self {
            content,
            chars: content.main_text_raw.chars().collect(),
            out: String::new(),
        }
    }

    /// Shrink `[start, end)` past surrounding whitespace.
    fn trimmed(&self, mut start: usize, mut end: usize) -> (usize, usize) {
        while start < end && self.chars[start].is_whitespace() {
            start += 1;
        }
        while end > start && self.chars[end - 1].is_whitespace() {
            end -= 1;
        }
        (start, end)
    }

    fn open_reference(&mut self, reference: &FootnoteReference) {
        let number = escape(&reference.reference_number);
        self.out.push_str(&format!(r#"<span class="footnote-ref" data-footnote-id="{number}""#));
        let content = self.content;
        match content.footnote(&reference.reference_number) {
            Some(footnote) => {
                if let Some(date) = &footnote.effective_date {
                    self.out.push_str(&format!(r#" data-effective-date="{}""#, escape(date)));
                }
                if let Some(kind) = footnote.modification_type {
                    self.out.push_str(&format!(r#" data-modification-type="{}""#, kind.as_str()));
                }
                if let Some(url) = footnote
                    .direct_article_url
                    .as_ref()
                    .or(footnote.direct_url.as_ref())
                {
                    self.out.push_str(&format!(r#" data-direct-article-url="{}""#, escape(url)));
                }
                if let Some(citation) = &footnote.law_reference {
                    self.out.push_str(&format!(
                        r#" data-article-dossier-number="{}""#,
                        escape(&citation.dossier_number)
                    ));
                }
            }
            None => self.out.push_str(r#" data-dangling="true""#),
        }
        self.out.push('>');
    }

    /// Emit `[start, end)` with every footnote span clipped to the range.
    fn inline(&mut self, start: usize, end: usize) {
        let content = self.content;
        let mut spans: Vec<(usize, usize, &FootnoteReference)> = content
            .footnote_references
            .iter()
            .filter_map(|r| {
                let (s, e) = (r.text_position, r.end_position());
                if s == e {
                    (start..end).contains(&s).then_some((s, e, r))
                } else {
                    let (cs, ce) = (s.max(start), e.min(end));
                    (cs < ce).then_some((cs, ce, r))
                }
            })
            .collect();
        spans.sort_by_key(|&(s, e, _)| (s, std::cmp::Reverse(e)));

        let mut open: Vec<usize> = Vec::new();
        let mut next = 0;
        for i in start..=end {
            while open.last().is_some_and(|&e| e <= i) {
                open.pop();
                self.out.push_str("</span>");
            }
            if i == end {
                break;
            }
            while let Some(&(s, e, reference)) = spans.get(next) {
                if s != i {
                    break;
                }
                self.open_reference(reference);
                if s == e {
                    self.out.push_str("</span>");
                } else {
                    open.push(e);
                }
                next += 1;
            }
            escape_into(&mut self.out, self.chars[i]);
        }
        while open.pop().is_some() {
            self.out.push_str("</span>");
        }
    }

    fn provision_item(&mut self, class: &str, offset: usize, segment: &str, span: &ProvisionSpan) {
        let to_char = |byte: usize| offset + char_offset(segment, byte);
        self.out.push_str(&format!(
            r#"<li class="{class}" data-number="{number}"><span class="provision-number">{number}</span>"#,
            number = escape(&span.number)
        ));
        let (s, e) = self.trimmed(to_char(span.text_start), to_char(span.own_text_end()));
        if s < e {
            self.out.push(' ');
            self.inline(s, e);
        }
        if !span.sub_items.is_empty() {
            self.out.push_str(r#"<ol class="sub-provisions">"#);
            for sub in &span.sub_items {
                self.provision_item("sub-provision", offset, segment, sub);
            }
            self.out.push_str("</ol>");
        }
        self.out.push_str("</li>");
    }

    /// Intro paragraph followed by the provision list of `[start, end)`.
    fn block(&mut self, start: usize, end: usize) {
        let segment: String = self.chars[start..end].iter().collect();
        let provisions = scan_provisions(&segment);

        let intro_end = provisions
            .first()
            .map_or(end, |p| start + char_offset(&segment, p.marker_start));
        let (s, e) = self.trimmed(start, intro_end);
        if s < e {
            self.out.push_str("<p>");
            self.inline(s, e);
            self.out.push_str("</p>");
        }

        if !provisions.is_empty() {
            self.out.push_str(r#"<ol class="provisions">"#);
            for span in &provisions {
                self.provision_item("provision", start, &segment, span);
            }
            self.out.push_str("</ol>");
        }
    }

    fn footnotes(&mut self, anchor: &str) {
        let content = self.content;
        if content.footnotes.is_empty() {
            return;
        }
        self.out
            .push_str(r#"<footer class="article-footnotes"><ol class="footnotes">"#);
        for footnote in &content.footnotes {
            let number = escape(&footnote.footnote_number);
            self.out.push_str(&format!(
                r#"<li class="footnote" id="{anchor}-fn-{number}" data-footnote-number="{number}">{}</li>"#,
                escape(&footnote.footnote_content)
            ));
        }
        self.out.push_str("</ol></footer>");
    }

    fn render(mut self) -> String {
        let content = self.content;
        let anchor = escape(&content.anchor_id);
        let number = escape(&content.article_number);

        self.out.push_str(&format!(
            r#"<article class="legal-article" id="{anchor}" data-article-number="{number}">"#
        ));
        self.out.push_str(&format!(
            r#"<header class="article-header"><h2 class="article-number">Art. {number}</h2>"#
        ));
        if let Some(status) = &content.abrogation_status {
            self.out.push_str(&format!(r#"<span class="article-status">{}</span>"#, escape(status)));
        }
        self.out.push_str("</header>");
        self.out.push_str(r#"<div class="article-content">"#);

        let paragraphs = find_paragraphs(&content.main_text_raw);
        let len = self.chars.len();
        if paragraphs.is_empty() {
            self.out.push_str(r#"<div class="article-text">"#);
            self.block(0, len);
            self.out.push_str("</div>");
        } else {
            let (s, e) = self.trimmed(0, paragraphs[0].start);
            if s < e {
                self.out.push_str(r#"<div class="article-intro">"#);
                self.block(s, e);
                self.out.push_str("</div>");
            }
            for (index, paragraph) in paragraphs.iter().enumerate() {
                let end = paragraphs.get(index + 1).map_or(len, |next| next.start);
                let marker = escape(&paragraph.marker);
                self.out.push_str(&format!(
                    r#"<section class="paragraph" id="{anchor}-para-{}"><h3 class="paragraph-marker">§ {marker}</h3><div class="paragraph-content">"#,
                    marker.replace('/', "-")
                ));
                self.block(paragraph.content_start, end);
                self.out.push_str("</div></section>");
            }
        }

        self.out.push_str("</div>");
        self.footnotes(&anchor);
        self.out.push_str("</article>");
        self.out
    }
}

/// Render one article.
#[must_use]
pub fn render_article(content: &ArticleContent) -> String {
    Renderer::new(content).render()
}
