//! Runtime configuration for corpus runs.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CorpusError, Result};

/// Default output directory for parsed documents.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default number of documents parsed concurrently.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// File name of the run report written next to the documents.
pub const REPORT_FILE_NAME: &str = "corpus_report.json";

#[derive(Debug, Clone)]
pub struct CorpusConfig {
    pub output_dir: PathBuf,
    pub overrides_dir: Option<PathBuf>,
    pub max_parallel: usize,
    /// Per-document limit; the task is abandoned when it is exceeded.
    pub document_timeout: Option<Duration>,
    pub pretty_json: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            overrides_dir: None,
            max_parallel: DEFAULT_MAX_PARALLEL,
            document_timeout: None,
            pretty_json: false,
        }
    }
}

impl CorpusConfig {
    /// Read the configuration from `JUSTEL_*` environment variables.
    ///
    /// Unset or unparseable values fall back to the defaults; a parallelism
    /// of zero is rejected.
    pub fn from_env() -> Result<Self> {
        let output_dir = std::env::var("JUSTEL_OUTPUT_DIR")
            .unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.into())
            .into();

        let overrides_dir = std::env::var("JUSTEL_OVERRIDES_DIR").ok().map(PathBuf::from);

        let max_parallel = std::env::var("JUSTEL_MAX_PARALLEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_PARALLEL);

        let document_timeout = std::env::var("JUSTEL_DOCUMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs);

        let pretty_json = std::env::var("JUSTEL_PRETTY_JSON")
            .ok()
            .map(|v| v != "false" && v != "0")
            .unwrap_or(false);

        Self {
            output_dir,
            overrides_dir,
            max_parallel,
            document_timeout,
            pretty_json,
        }
        .validated()
    }

    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_overrides_dir(mut self, overrides_dir: impl Into<PathBuf>) -> Self {
        self.overrides_dir = Some(overrides_dir.into());
        self
    }

    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    #[must_use]
    pub fn with_document_timeout(mut self, timeout: Duration) -> Self {
        self.document_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_pretty_json(mut self, pretty_json: bool) -> Self {
        self.pretty_json = pretty_json;
        self
    }

    /// Check the settings that cannot be used as given.
    pub fn validated(self) -> Result<Self> {
        if self.max_parallel == 0 {
            return Err(CorpusError::Config("max_parallel must be at least 1".into()));
        }
        if self.document_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CorpusError::Config("document timeout must be positive".into()));
        }
        Ok(self)
    }
}
