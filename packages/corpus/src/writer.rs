//! JSON output of parsed documents and run reports.

use std::path::{Path, PathBuf};

use serde::Serialize;

use justel_parser::types::ParsedDocument;

use crate::config::REPORT_FILE_NAME;
use crate::error::Result;
use crate::runner::{CorpusOutcome, CorpusReport};

/// Output file name of a document: the dossier number with `/` replaced.
///
/// # Examples
/// ```
/// use justel_corpus::writer::document_file_name;
///
/// assert_eq!(document_file_name("2008-12-22/33"), "2008-12-22_33.json");
/// ```
#[must_use]
pub fn document_file_name(dossier_number: &str) -> String {
    format!("{}.json", dossier_number.trim().replace(['/', '\\'], "_"))
}

/// Serialize a value as JSON, pretty-printed or compact.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Write one document into `dir`, returning the written path.
pub fn write_document(document: &ParsedDocument, dir: &Path, pretty: bool) -> Result<PathBuf> {
    let path = dir.join(document_file_name(document.dossier_number()));
    std::fs::write(&path, to_json(document, pretty)?)?;
    Ok(path)
}

pub fn write_report(report: &CorpusReport, dir: &Path, pretty: bool) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE_NAME);
    std::fs::write(&path, to_json(report, pretty)?)?;
    Ok(path)
}

/// Write every document and the report, creating `dir` when needed.
pub fn write_outcome(outcome: &CorpusOutcome, dir: &Path, pretty: bool) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(outcome.documents.len() + 1);
    for document in &outcome.documents {
        paths.push(write_document(document, dir, pretty)?);
    }
    paths.push(write_report(&outcome.report, dir, pretty)?);
    tracing::info!(files = paths.len(), dir = %dir.display(), "wrote corpus output");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_file_name() {
        assert_eq!(document_file_name("2016-01-15/17"), "2016-01-15_17.json");
        assert_eq!(document_file_name(" X "), "X.json");
    }

    #[test]
    fn test_to_json_compact_and_pretty() {
        let report = CorpusReport::default();
        assert!(!to_json(&report, false).unwrap().contains('\n'));
        assert!(to_json(&report, true).unwrap().contains("\n  \"total\": 0"));
    }

    #[test]
    fn test_write_report_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&CorpusReport::default(), dir.path(), false).unwrap();
        assert_eq!(path, dir.path().join("corpus_report.json"));
        let written: CorpusReport =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, CorpusReport::default());
    }
}
