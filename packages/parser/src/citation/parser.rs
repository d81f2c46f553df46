//! Parser for inline legal citations.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::dates::normalize_date;
use crate::error::{ParserError, Result};
use crate::types::{CitationType, LegalCitation, ModificationType};

/// Shared citation template.
///
/// `<[prefix par] LAWTYPE [DOSSIER](URL), art. N, SEQ; En vigueur : DATE>`, where
/// the dossier may also appear bare and every part after the dossier is optional.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CITATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"<\s*",
        r"(?:(?P<prefix>(?i:ins[ée]r[ée](?:\s+pour\s+la\s+r[ée]gion\s+[^<>]*?)?|intitul[ée]\s+modifi[ée]|modifi[ée]|abrog[ée]|remplac[ée]))\s+(?i:par)\s+)?",
        r"(?P<law>(?i:[a-z]+))\s+",
        r"(?:\[(?P<bracketed>[^\]]+)\]|(?P<bare>\d{4}-\d{2}-\d{2}/\d+))",
        r"(?:\((?P<url>[^)\s]+)\))?",
        r"(?:\s*,\s*art\.?\s*(?P<article>[^,;>]+))?",
        r"(?:\s*,\s*(?P<sequence>[^;>]+))?",
        r"(?:\s*;\s*(?:\*\*)?\s*En\s+vigueur\s*(?:\*\*)?\s*:?\s*(?P<date>[^>]*))?",
        r"\s*>",
    ))
    .expect("valid regex")
});

/// Leading article number with optional suffix and slash part.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:[a-z]+)?(?:/\d+)?)").expect("valid regex"));

/// A citation together with the kind of change its prefix announces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationMatch {
    pub citation: LegalCitation,
    pub modification_type: ModificationType,
}

/// Map a citation prefix ("Inséré par", "Abrogé par", ...) to its modification type.
fn classify_prefix(prefix: Option<&str>) -> ModificationType {
    let Some(prefix) = prefix else {
        return ModificationType::Modification;
    };
    let lower = prefix.to_lowercase();
    if lower.starts_with("abrog") {
        ModificationType::Abrogation
    } else if lower.starts_with("ins") {
        ModificationType::Insertion
    } else if lower.starts_with("rempla") {
        ModificationType::Replacement
    } else {
        ModificationType::Modification
    }
}

/// Reduce an article reference to its leading number ("105", "2bis", "8/1").
fn clean_article_number(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        ARTICLE_NUMBER
            .captures(trimmed)
            .map_or_else(|| trimmed.to_string(), |caps| caps[1].to_string()),
    )
}

fn non_empty(value: Option<regex::Match<'_>>) -> Option<String> {
    value
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

fn build_match(text: &str, caps: &Captures<'_>) -> Option<CitationMatch> {
    let whole = caps.get(0)?;
    let dossier_number = caps
        .name("bracketed")
        .or_else(|| caps.name("bare"))?
        .as_str()
        .trim()
        .to_string();

    let modification_type = classify_prefix(caps.name("prefix").map(|m| m.as_str()));
    let citation_type = if modification_type == ModificationType::Abrogation {
        CitationType::Abrogation
    } else {
        CitationType::Standard
    };

    Some(CitationMatch {
        citation: LegalCitation {
            citation_type,
            law_type: caps["law"].to_uppercase(),
            dossier_number,
            article_number: caps
                .name("article")
                .and_then(|m| clean_article_number(m.as_str())),
            sequence_number: non_empty(caps.name("sequence")),
            effective_date: caps.name("date").and_then(|m| normalize_date(m.as_str())),
            url: non_empty(caps.name("url")).map(|u| u.trim_end_matches('/').to_string()),
            matched_text: whole.as_str().to_string(),
            start_pos: char_offset(text, whole.start()),
            end_pos: char_offset(text, whole.end()),
        },
        modification_type,
    })
}

/// Find the first citation in `text`, keeping the prefix classification.
#[must_use]
pub fn scan_citation(text: &str) -> Option<CitationMatch> {
    CITATION_PATTERN
        .captures_iter(text)
        .find_map(|caps| build_match(text, &caps))
}

/// Parse one raw citation string.
///
/// # Examples
/// ```
/// use justel_parser::citation::parse_citation;
/// use justel_parser::types::CitationType;
///
/// let citation = parse_citation("<AGF 2016-01-15/17, art. 13, 020; En vigueur: 20-03-2016>").unwrap();
/// assert_eq!(citation.law_type, "AGF");
/// assert_eq!(citation.effective_date.as_deref(), Some("2016-03-20"));
/// assert_eq!(citation.citation_type, CitationType::Standard);
/// ```
pub fn parse_citation(raw: &str) -> Result<LegalCitation> {
    scan_citation(raw)
        .map(|m| m.citation)
        .ok_or_else(|| ParserError::CitationParse(raw.trim().to_string()))
}

/// Every citation in `text`, in order of appearance.
#[must_use]
pub fn find_citations(text: &str) -> Vec<LegalCitation> {
    CITATION_PATTERN
        .captures_iter(text)
        .filter_map(|caps| build_match(text, &caps))
        .map(|m| m.citation)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bare_dossier_citation() {
        let raw = "<AGF 2016-01-15/17, art. 13, 020; En vigueur: 20-03-2016>";
        let citation = parse_citation(raw).unwrap();
        assert_eq!(
            citation,
            LegalCitation {
                citation_type: CitationType::Standard,
                law_type: "AGF".to_string(),
                dossier_number: "2016-01-15/17".to_string(),
                article_number: Some("13".to_string()),
                sequence_number: Some("020".to_string()),
                effective_date: Some("2016-03-20".to_string()),
                url: None,
                matched_text: raw.to_string(),
                start_pos: 0,
                end_pos: raw.chars().count(),
            }
        );
    }

    #[test]
    fn test_footnote_citation_with_url() {
        let raw = "(1)<L [2008-12-22/33](https://www.ejustice.just.fgov.be/cgi_loi/change_lg.pl?language=fr&la=F&cn=2008122233&table_name=loi/), art. 105, 013; En vigueur : 08-01-2009>";
        let found = scan_citation(raw).unwrap();
        let citation = found.citation;
        assert_eq!(citation.law_type, "L");
        assert_eq!(citation.dossier_number, "2008-12-22/33");
        assert_eq!(
            citation.url.as_deref(),
            Some("https://www.ejustice.just.fgov.be/cgi_loi/change_lg.pl?language=fr&la=F&cn=2008122233&table_name=loi")
        );
        assert_eq!(citation.article_number.as_deref(), Some("105"));
        assert_eq!(citation.sequence_number.as_deref(), Some("013"));
        assert_eq!(citation.effective_date.as_deref(), Some("2009-01-08"));
        assert_eq!(citation.start_pos, 3);
        assert_eq!(found.modification_type, ModificationType::Modification);
    }

    #[test]
    fn test_abrogation_citation() {
        let raw = "<Abrogé par L [2010-04-29/05](https://example.be/loi), art. 7, 002; En vigueur: **01-07-2010**>";
        let found = scan_citation(raw).unwrap();
        assert_eq!(found.citation.citation_type, CitationType::Abrogation);
        assert_eq!(found.modification_type, ModificationType::Abrogation);
        assert_eq!(found.citation.effective_date.as_deref(), Some("2010-07-01"));
    }

    #[test]
    fn test_prefixes_map_to_modification_types() {
        let cases = [
            ("<Inséré par DRW [2014-02-27/12](u), art. 2, 003; En vigueur : 01-01-2015>", ModificationType::Insertion),
            ("<Inséré pour la Région wallonne par DRW [2014-02-27/12](u), art. 2, 003; En vigueur : 01-01-2015>", ModificationType::Insertion),
            ("<Remplacé par L [2014-02-27/12](u), art. 2, 003; En vigueur : 01-01-2015>", ModificationType::Replacement),
            ("<intitulé modifié par AR [2014-02-27/12](u), art. 2, 003; En vigueur : 01-01-2015>", ModificationType::Modification),
        ];
        for (raw, expected) in cases {
            let found = scan_citation(raw).unwrap();
            assert_eq!(found.modification_type, expected, "{raw}");
            assert!(!found.citation.law_type.is_empty());
            assert_eq!(found.citation.citation_type, CitationType::Standard);
        }
    }

    #[test]
    fn test_article_number_keeps_suffix() {
        let citation =
            parse_citation("<L 2004-12-27/30, art. 2bis, 004; En vigueur : 10-01-2005>").unwrap();
        assert_eq!(citation.article_number.as_deref(), Some("2bis"));
    }

    #[test]
    fn test_missing_optional_parts() {
        let citation = parse_citation("<L [1999-03-23/40](https://example.be)>").unwrap();
        assert_eq!(citation.dossier_number, "1999-03-23/40");
        assert_eq!(citation.article_number, None);
        assert_eq!(citation.sequence_number, None);
        assert_eq!(citation.effective_date, None);
    }

    #[test]
    fn test_law_type_is_case_insensitive() {
        let citation = parse_citation("<modifié par drw 2016-12-15/07, art. 3, 004>").unwrap();
        assert_eq!(citation.law_type, "DRW");
        assert_eq!(citation.dossier_number, "2016-12-15/07");
    }

    #[test]
    fn test_law_type_needs_space_before_dossier() {
        assert!(parse_citation("<L2010-04-29/05, art. 7, 002>").is_err());
    }

    #[test]
    fn test_unrecognized_citation() {
        let err = parse_citation("(2)<NOTE : voir la loi du 5 mai 1999>").unwrap_err();
        assert!(matches!(err, ParserError::CitationParse(_)));
    }

    #[test]
    fn test_find_citations_positions_are_char_offsets() {
        let text = "Abrogé: <L 2010-04-29/05, art. 7, 002; En vigueur : 01-07-2010> et <AR 2011-01-01/01, art. 1, 001>";
        let found = find_citations(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].start_pos, 8);
        assert_eq!(found[1].law_type, "AR");
        let chars: Vec<char> = text.chars().collect();
        let slice: String = chars[found[1].start_pos..found[1].end_pos].iter().collect();
        assert_eq!(slice, found[1].matched_text);
    }
}
