//! Justel Corpus - Parallel parsing and linking of a Justel corpus.
//!
//! Loads a directory of source documents, parses each one on the blocking
//! pool (substituting hand-corrected replacements where present), links the
//! results by their declared amendments and writes one JSON file per
//! document plus a run report.
//!
//! # Example
//!
//! ```
//! use justel_corpus::CorpusConfig;
//!
//! let config = CorpusConfig::new("output").with_max_parallel(8);
//! assert!(config.validated().is_ok());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Runtime configuration from the environment
//! - [`error`]: Error types and Result alias
//! - [`loader`]: Source discovery and loading
//! - [`runner`]: Bounded parallel parsing and linking
//! - [`writer`]: JSON output
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod runner;
pub mod writer;

// Re-export main functions
pub use runner::{run_corpus, CorpusRunner};

// Re-export commonly used items
pub use config::CorpusConfig;
pub use error::{CorpusError, Result};
pub use runner::{CorpusOutcome, CorpusReport, DocumentFailure};
