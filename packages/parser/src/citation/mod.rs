//! Inline legal citation parsing.
//!
//! Citations appear in footnote tables and abrogation notices:
//!
//! ```text
//! (1)<L [2008-12-22/33](https://...), art. 105, 013; En vigueur : 08-01-2009>
//! <Abrogé par L 2010-04-29/05, art. 7, 002; En vigueur: 01-07-2010>
//! ```

mod dates;
mod parser;

pub use dates::{clean_date_text, normalize_date, parse_date_to_iso};
pub use parser::{find_citations, parse_citation, scan_citation, CitationMatch};
