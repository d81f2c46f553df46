//! Configuration constants and validation functions for the parser.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::error::{ParserError, Result};

/// Base URL of the eJustice (Justel) site.
pub const EJUSTICE_BASE_URL: &str = "https://www.ejustice.just.fgov.be";

/// Consolidated-text URL template; `{cn}` is replaced by the compact dossier number.
pub const DOSSIER_URL_TEMPLATE: &str =
    "https://www.ejustice.just.fgov.be/cgi_loi/change_lg.pl?language=fr&la=F&cn={cn}&table_name=loi";

/// Number of leading characters inspected for an article abrogation marker.
pub const ABROGATION_SCAN_WINDOW: usize = 200;

/// Language of the consolidated texts handled by this crate.
pub const DEFAULT_LANGUAGE: &str = "fr";

/// Prefix of every article anchor id.
pub const ANCHOR_PREFIX: &str = "art_";

/// Dossier number pattern: publication date followed by a sequence number.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DOSSIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})/(\d+)$").expect("valid regex")
});

/// Date pattern: YYYY-MM-DD.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// Validate dossier number format.
///
/// # Examples
/// ```
/// use justel_parser::config::validate_dossier_number;
///
/// assert!(validate_dossier_number("2016-01-15/17").is_ok());
/// assert!(validate_dossier_number("2016011517").is_err());
/// ```
pub fn validate_dossier_number(dossier_number: &str) -> Result<()> {
    if DOSSIER_PATTERN.is_match(dossier_number) {
        Ok(())
    } else {
        Err(ParserError::InvalidDossierNumber(dossier_number.to_string()))
    }
}

/// Validate an ISO date (YYYY-MM-DD) that must exist in the calendar.
///
/// # Examples
/// ```
/// use justel_parser::config::validate_date;
///
/// assert!(validate_date("2020-01-01").is_ok());
/// assert!(validate_date("2020-13-01").is_err());
/// ```
pub fn validate_date(date_str: &str) -> Result<()> {
    if !DATE_PATTERN.is_match(date_str) {
        return Err(ParserError::InvalidDate(date_str.to_string()));
    }
    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ParserError::InvalidDate(date_str.to_string()))
}

/// Compact form of a dossier number as used in Justel URLs.
///
/// `2016-01-15/17` becomes `2016011517`. Returns `None` for malformed numbers.
#[must_use]
pub fn compact_dossier_number(dossier_number: &str) -> Option<String> {
    let caps = DOSSIER_PATTERN.captures(dossier_number.trim())?;
    let sequence: u32 = caps[4].parse().ok()?;
    Some(format!("{}{}{}{sequence:02}", &caps[1], &caps[2], &caps[3]))
}

/// Build the consolidated-text URL for a dossier number.
///
/// # Examples
/// ```
/// use justel_parser::config::dossier_url;
///
/// assert_eq!(
///     dossier_url("2016-01-15/17").as_deref(),
///     Some("https://www.ejustice.just.fgov.be/cgi_loi/change_lg.pl?language=fr&la=F&cn=2016011517&table_name=loi")
/// );
/// ```
#[must_use]
pub fn dossier_url(dossier_number: &str) -> Option<String> {
    compact_dossier_number(dossier_number).map(|cn| DOSSIER_URL_TEMPLATE.replace("{cn}", &cn))
}

/// Append an article anchor to a document URL.
#[must_use]
pub fn article_url(base_url: &str, article_number: &str) -> String {
    format!("{}#Art.{}", base_url.trim_end_matches('/'), article_number.trim())
}

/// Deterministic anchor id for an article number.
///
/// Letters, digits, `.` and `-` are kept, slashes become `-`, quotes and
/// degree signs are dropped, and any other run of characters becomes `_`.
///
/// # Examples
/// ```
/// use justel_parser::config::anchor_id;
///
/// assert_eq!(anchor_id("1er"), "art_1er");
/// assert_eq!(anchor_id("16 DROIT FUTUR"), "art_16_DROIT_FUTUR");
/// assert_eq!(anchor_id("8/1"), "art_8-1");
/// ```
#[must_use]
pub fn anchor_id(article_number: &str) -> String {
    let mut slug = String::with_capacity(article_number.len());
    for c in article_number.trim().nfc() {
        match c {
            c if c.is_alphanumeric() => slug.push(c),
            '.' | '-' => slug.push(c),
            '/' => slug.push('-'),
            '°' | '\'' | '"' => {}
            _ => {
                if !slug.ends_with('_') {
                    slug.push('_');
                }
            }
        }
    }
    format!("{ANCHOR_PREFIX}{}", slug.trim_matches('_'))
}

/// Normalized comparison key for heading labels.
///
/// NFC, whitespace collapsed, case folded.
#[must_use]
pub fn label_key(label: &str) -> String {
    label
        .nfc()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
