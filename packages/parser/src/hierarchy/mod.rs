//! Document hierarchy: heading grammar and tree builder.
//!
//! `build_hierarchy` turns a source event stream into the document forest,
//! assembling each article on the way.

mod builder;
mod grammar;

pub use builder::HierarchyBuilder;
pub use grammar::{clean_heading_text, create_belgian_heading_grammar, HeadingGrammar, NodeSpec};

use crate::article::assemble_article;
use crate::error::{Result, SourceLocation};
use crate::source::SourceEvent;
use crate::types::{DocumentNode, ExtractionIssue};

/// Result of building one document's tree.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub nodes: Vec<DocumentNode>,
    pub issues: Vec<ExtractionIssue>,
}

/// Build the document forest from an event stream.
///
/// Fails with `StructuralConflict` when two articles collide in a way the
/// builder cannot merge. Article-scoped problems are collected as issues.
pub fn build_hierarchy(
    events: &[SourceEvent],
    grammar: &HeadingGrammar,
    generated_at: &str,
) -> Result<Hierarchy> {
    let mut builder = HierarchyBuilder::new(grammar);
    let mut issues = Vec::new();

    for (index, event) in events.iter().enumerate() {
        let location = SourceLocation::new(index, event.line());
        match event {
            SourceEvent::Heading {
                kind,
                title_type,
                title_content,
                rank,
                ..
            } => {
                let kind = kind.or_else(|| grammar.classify(title_type)).unwrap_or_else(|| {
                    tracing::debug!(title_type = %title_type, "unknown heading type, using fallback");
                    grammar.fallback()
                });
                if let Some(given) = *rank {
                    if given != grammar.rank(kind) {
                        tracing::warn!(
                            title_type = %title_type,
                            given,
                            expected = grammar.rank(kind),
                            "heading rank disagrees with grammar"
                        );
                    }
                }
                builder.push_heading(kind, title_type, title_content);
            }
            SourceEvent::Article { number, body, .. } => {
                let assembled = assemble_article(&clean_heading_text(number), body, generated_at);
                issues.extend(assembled.issues);
                builder.push_article(assembled.content, location)?;
            }
        }
    }

    Ok(Hierarchy {
        nodes: builder.finish(),
        issues,
    })
}
