//! Parallel corpus runs.
//!
//! Every document is parsed in its own blocking task, bounded by a
//! semaphore. Failures are collected per document; the linker runs once all
//! tasks have finished.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use justel_parser::{
    link_documents, process_document, LinkReport, OverrideTable, ParseOptions, SourceDocument,
};
use justel_parser::types::ParsedDocument;

use crate::config::CorpusConfig;
use crate::error::{CorpusError, Result};

/// Called with the dossier number of every finished document.
pub type ProgressFn = Arc<dyn Fn(&str) + Send + Sync>;

/// A document that produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub dossier_number: String,
    pub source_file: Option<String>,
    pub reason: String,
}

/// Summary of a corpus run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusReport {
    pub total: usize,
    pub parsed: usize,
    pub overridden: usize,
    pub documents_with_issues: usize,
    pub failures: Vec<DocumentFailure>,
    pub link: LinkReport,
}

impl CorpusReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.documents_with_issues == 0 && self.link.is_clean()
    }
}

/// Linked documents, in source order, with the run report.
#[derive(Debug, Clone)]
pub struct CorpusOutcome {
    pub documents: Vec<ParsedDocument>,
    pub report: CorpusReport,
}

/// Runs a corpus through the parser and the linker.
pub struct CorpusRunner {
    max_parallel: usize,
    document_timeout: Option<Duration>,
    overrides: Arc<OverrideTable>,
    options: Arc<ParseOptions>,
    progress: Option<ProgressFn>,
}

impl CorpusRunner {
    #[must_use]
    pub fn new(config: &CorpusConfig) -> Self {
        Self {
            max_parallel: config.max_parallel.max(1),
            document_timeout: config.document_timeout,
            overrides: Arc::new(OverrideTable::new()),
            options: Arc::new(ParseOptions::new()),
            progress: None,
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Arc<OverrideTable>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Share one set of options (and thus one timestamp) across the run.
    #[must_use]
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Parse every source, then link the parsed documents.
    pub async fn run(self, sources: Vec<SourceDocument>) -> Result<CorpusOutcome> {
        let total = sources.len();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        tracing::info!(documents = total, max_parallel = self.max_parallel, "starting corpus run");

        let mut handles = Vec::with_capacity(total);
        for source in sources {
            let semaphore = Arc::clone(&semaphore);
            let overrides = Arc::clone(&self.overrides);
            let options = Arc::clone(&self.options);
            let progress = self.progress.clone();
            let timeout = self.document_timeout;

            handles.push(tokio::spawn(async move {
                let dossier = source.dossier_number.clone();
                let source_file = source.source_file.clone();
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| CorpusError::Config(e.to_string()))?;

                let result = parse_one(source, overrides, options, timeout).await;
                if let Some(progress) = &progress {
                    progress(&dossier);
                }
                Ok::<_, CorpusError>(result.map_err(|err| {
                    tracing::warn!(dossier = %dossier, error = %err, "document failed");
                    DocumentFailure {
                        dossier_number: dossier,
                        source_file,
                        reason: err.to_string(),
                    }
                }))
            }));
        }

        let mut parsed = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for handle in handles {
            match handle.await?? {
                Ok(document) => parsed.push(document),
                Err(failure) => failures.push(failure),
            }
        }

        let overridden = parsed
            .iter()
            .filter(|d| d.extraction_metadata.completeness_flags.is_manual_override)
            .count();
        let documents_with_issues = parsed
            .iter()
            .filter(|d| !d.extraction_metadata.issues.is_empty())
            .count();

        let (documents, link) = link_documents(parsed);
        let report = CorpusReport {
            total,
            parsed: documents.len(),
            overridden,
            documents_with_issues,
            failures,
            link,
        };

        tracing::info!(
            parsed = report.parsed,
            failed = report.failures.len(),
            overridden = report.overridden,
            "corpus run finished"
        );
        Ok(CorpusOutcome { documents, report })
    }
}

/// Parse one document on the blocking pool, abandoning it after `timeout`.
async fn parse_one(
    source: SourceDocument,
    overrides: Arc<OverrideTable>,
    options: Arc<ParseOptions>,
    timeout: Option<Duration>,
) -> Result<ParsedDocument> {
    let dossier = source.dossier_number.clone();
    let task = tokio::task::spawn_blocking(move || process_document(&source, &overrides, &options));

    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| CorpusError::Timeout(dossier))?,
        None => task.await,
    };
    Ok(joined??)
}

/// Parse and link a corpus with the given configuration.
pub async fn run_corpus(
    sources: Vec<SourceDocument>,
    overrides: Arc<OverrideTable>,
    config: &CorpusConfig,
) -> Result<CorpusOutcome> {
    CorpusRunner::new(config)
        .with_overrides(overrides)
        .run(sources)
        .await
}
