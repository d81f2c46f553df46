//! Footnote tables and bracket-span resolution.
//!
//! An article body holds its text, a separator, and a footnote section. The
//! text carries `[n ...]n` spans pointing at the `(n)` entries of the section.
//! Footnote numbers are only meaningful within their own article.

mod brackets;
mod table;

pub use brackets::{resolve_brackets, ResolvedText};
pub use table::{
    build_footnote, link_references, parse_footnote_section, split_footnote_section,
    FootnoteTable,
};
