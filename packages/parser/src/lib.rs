//! Justel Parser - Structural parsing of consolidated Belgian legislation.
//!
//! This crate turns consolidated texts from the Justel database into a
//! hierarchical document model: a forest of livres, titres, chapitres,
//! sections and articles, where every article carries its de-bracketed text,
//! its footnote table with parsed citations, its numbered provisions and a
//! rendered HTML view. Documents of a corpus are then linked by the
//! amendments they declare.
//!
//! # Example
//!
//! ```
//! use justel_parser::{parse_document, ParseOptions, SourceDocument, SourceEvent};
//!
//! let source = SourceDocument::new("2016-01-15/17").with_events(vec![
//!     SourceEvent::heading("CHAPITRE Ier", "Dispositions générales"),
//!     SourceEvent::article("1er", "Le [1 Gouvernement]1 fixe les modalités.\n\\-----\n(1)<L 2017-01-01/3, art. 4, 002>"),
//! ]);
//!
//! let document = parse_document(&source, &ParseOptions::default()).unwrap();
//! let article = document.articles().next().unwrap();
//! assert_eq!(article.anchor_id, "art_1er");
//! assert_eq!(article.main_text_raw, "Le Gouvernement fixe les modalités.");
//! assert_eq!(article.footnote_references[0].referenced_text, "Gouvernement");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, URL templates, validators and anchor slugs
//! - [`types`]: Output data model (DocumentNode, ArticleContent, Footnote, ...)
//! - [`error`]: Error types and Result alias
//! - [`source`]: Source event stream and its JSON/YAML form
//! - [`tokenizer`]: Gazette markdown to source events
//! - [`citation`]: Inline legal citation parser
//! - [`footnotes`]: Footnote tables and bracket-span resolution
//! - [`provisions`]: Numbered-provision extraction
//! - [`hierarchy`]: Declarative heading grammar and tree builder
//! - [`article`]: Assembly of one article
//! - [`html`]: Deterministic HTML rendering
//! - [`document`]: Per-document driver
//! - [`overrides`]: Hand-corrected replacement documents
//! - [`linker`]: Cross-document modification history

pub mod article;
pub mod citation;
pub mod config;
pub mod document;
pub mod error;
pub mod footnotes;
pub mod hierarchy;
pub mod html;
pub mod linker;
pub mod overrides;
pub mod provisions;
pub mod source;
pub mod tokenizer;
pub mod types;

// Re-export main functions
pub use document::{parse_document, process_document, ParseOptions, PARSER_VERSION};
pub use linker::{link_documents, AmendmentIndex, LinkReport};

// Re-export commonly used items
pub use config::{validate_date, validate_dossier_number};
pub use error::{ParserError, Result, SourceLocation};
pub use overrides::OverrideTable;
pub use source::{SourceDocument, SourceEvent, SourceMetadata};
pub use types::{ArticleContent, DocumentNode, NodeKind, ParsedDocument};
