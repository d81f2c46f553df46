//! Date normalization for citation and metadata fields.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Numeric dates: DD-MM-YYYY, DD/MM/YYYY or DD.MM.YYYY.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[-/.](\d{1,2})[-/.](\d{4})$").expect("valid regex")
});

/// ISO dates, possibly followed by a time part.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})").expect("valid regex"));

/// French long form: "29 décembre 2016", "1er janvier 2020".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FRENCH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?:er)?\s+([a-zéû]+)\s+(\d{4})$").expect("valid regex")
});

const FRENCH_MONTHS: [(&str, u32); 15] = [
    ("janvier", 1),
    ("fevrier", 2),
    ("février", 2),
    ("mars", 3),
    ("avril", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("aout", 8),
    ("août", 8),
    ("septembre", 9),
    ("octobre", 10),
    ("novembre", 11),
    ("decembre", 12),
    ("décembre", 12),
];

fn french_month(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    FRENCH_MONTHS
        .iter()
        .find(|(month, _)| *month == lower)
        .map(|(_, number)| *number)
}

/// Strip markdown emphasis and trailing punctuation around a date value.
#[must_use]
pub fn clean_date_text(raw: &str) -> String {
    raw.replace("**", "")
        .trim()
        .trim_end_matches(['.', ',', ';'])
        .trim()
        .to_string()
}

/// Parse a date in any of the supported notations to an ISO-8601 string.
///
/// Returns `None` when the text is not a valid calendar date.
///
/// # Examples
/// ```
/// use justel_parser::citation::parse_date_to_iso;
///
/// assert_eq!(parse_date_to_iso("20-03-2016").as_deref(), Some("2016-03-20"));
/// assert_eq!(parse_date_to_iso("1er janvier 2020").as_deref(), Some("2020-01-01"));
/// assert_eq!(parse_date_to_iso("indéterminée"), None);
/// ```
#[must_use]
pub fn parse_date_to_iso(raw: &str) -> Option<String> {
    let text = clean_date_text(raw);

    let (year, month, day) = if let Some(caps) = NUMERIC_DATE.captures(&text) {
        (caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)
    } else if let Some(caps) = ISO_DATE.captures(&text) {
        (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    } else if let Some(caps) = FRENCH_DATE.captures(&text) {
        (caps[3].parse().ok()?, french_month(&caps[2])?, caps[1].parse().ok()?)
    } else {
        return None;
    };

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Normalize a date to ISO-8601 when possible, keeping the cleaned text otherwise.
#[must_use]
pub fn normalize_date(raw: &str) -> Option<String> {
    let cleaned = clean_date_text(raw);
    if cleaned.is_empty() {
        return None;
    }
    Some(parse_date_to_iso(&cleaned).unwrap_or(cleaned))
}
