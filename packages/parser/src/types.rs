//! Core data types for parsed documents.
//!
//! These types are the output model: the document tree, article content with
//! its footnote table and references, parsed citations and the cross-document
//! modification records. All of them serialize to the published JSON layout.

use serde::{Deserialize, Serialize};

/// Structural level of a node in the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Livre,
    Titre,
    Annexe,
    Chapitre,
    Section,
    SousSection,
    Article,
}

impl NodeKind {
    /// Get the string value used in the JSON output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Livre => "livre",
            Self::Titre => "titre",
            Self::Annexe => "annexe",
            Self::Chapitre => "chapitre",
            Self::Section => "section",
            Self::SousSection => "sous-section",
            Self::Article => "article",
        }
    }
}

/// A node in the document hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Raw heading text, e.g. "CHAPITRE II Dispositions générales".
    pub label: String,

    pub title_type: String,

    pub title_content: String,

    /// Fixed per-type ordinal, not the depth in the tree.
    pub rank: u8,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_content: Option<ArticleContent>,
}

impl DocumentNode {
    /// Create a container node without children.
    #[must_use]
    pub fn container(
        kind: NodeKind,
        rank: u8,
        title_type: impl Into<String>,
        title_content: impl Into<String>,
    ) -> Self {
        let title_type = title_type.into();
        let title_content = title_content.into();
        let label = if title_content.is_empty() {
            title_type.clone()
        } else {
            format!("{title_type} {title_content}")
        };
        Self {
            kind,
            label,
            title_type,
            title_content,
            rank,
            children: Vec::new(),
            article_content: None,
        }
    }

    /// Create an article leaf.
    #[must_use]
    pub fn article(rank: u8, content: ArticleContent) -> Self {
        Self {
            kind: NodeKind::Article,
            label: format!("Art. {}", content.article_number),
            title_type: "Art.".to_string(),
            title_content: content.article_number.clone(),
            rank,
            children: Vec::new(),
            article_content: Some(content),
        }
    }

    /// Depth-first iterator over the articles below (and including) this node.
    pub fn articles(&self) -> impl Iterator<Item = &ArticleContent> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            while let Some(node) = stack.pop() {
                stack.extend(node.children.iter().rev());
                if let Some(content) = &node.article_content {
                    return Some(content);
                }
            }
            None
        })
    }
}

/// Iterate over every article of a forest in document order.
pub fn forest_articles(nodes: &[DocumentNode]) -> impl Iterator<Item = &ArticleContent> + '_ {
    nodes.iter().flat_map(|node| node.articles())
}

/// Derived statistics about an article's rendered content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContentMetadata {
    pub paragraph_count: usize,
    pub provision_count: usize,
    pub has_tables: bool,
    pub generation_timestamp: String,
}

/// Content of one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleContent {
    /// Raw article label, e.g. "1er", "2bis", "16 DROIT FUTUR".
    pub article_number: String,

    pub anchor_id: String,

    /// De-bracketed plain text.
    pub main_text_raw: String,

    /// Rendered HTML, derived from the other fields.
    #[serde(default)]
    pub main_text: String,

    #[serde(default)]
    pub numbered_provisions: Vec<Provision>,

    /// Footnote table; numbers are scoped to this article.
    #[serde(default)]
    pub footnotes: Vec<Footnote>,

    #[serde(default)]
    pub footnote_references: Vec<FootnoteReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abrogation_status: Option<String>,

    /// Set when bracket resolution failed and `main_text_raw` still holds markup.
    #[serde(default)]
    pub bracket_resolution_skipped: bool,

    #[serde(default)]
    pub structured_content_metadata: StructuredContentMetadata,
}

impl ArticleContent {
    /// Look up a footnote of this article by its number.
    #[must_use]
    pub fn footnote(&self, number: &str) -> Option<&Footnote> {
        self.footnotes.iter().find(|f| f.footnote_number == number)
    }
}

/// A numbered provision ("1°") with optional lettered sub-items ("a)").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provision {
    pub number: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<Provision>,
}

impl Provision {
    #[must_use]
    pub fn new(number: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            text: text.into(),
            sub_items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sub_items(mut self, sub_items: Vec<Provision>) -> Self {
        self.sub_items = sub_items;
        self
    }
}

/// How an amending act touched the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationType {
    Insertion,
    Modification,
    Replacement,
    Abrogation,
}

impl ModificationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insertion => "insertion",
            Self::Modification => "modification",
            Self::Replacement => "replacement",
            Self::Abrogation => "abrogation",
        }
    }
}

/// One entry of an article's footnote table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footnote {
    pub footnote_number: String,

    /// Raw citation string as it appears in the source.
    pub footnote_content: String,

    pub law_reference: Option<LegalCitation>,

    pub effective_date: Option<String>,

    pub modification_type: Option<ModificationType>,

    pub direct_url: Option<String>,

    pub direct_article_url: Option<String>,
}

/// A bracket span in the article text pointing at a footnote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootnoteReference {
    /// Footnote id this span points to.
    pub reference_number: String,

    /// Character offset into the de-bracketed text.
    pub text_position: usize,

    pub referenced_text: String,

    /// Raw `[id ...]id` source span.
    pub bracket_pattern: String,

    /// Citation of the footnote, `None` when dangling or unparsed.
    #[serde(default)]
    pub law_reference: Option<LegalCitation>,
}

impl FootnoteReference {
    /// Character offset just past the referenced span.
    #[must_use]
    pub fn end_position(&self) -> usize {
        self.text_position + self.referenced_text.chars().count()
    }
}

/// Kind of a parsed citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationType {
    Standard,
    Abrogation,
}

impl CitationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Abrogation => "abrogation",
        }
    }
}

/// A parsed legal citation, e.g. `<L 2008-12-22/33, art. 105, 013; En vigueur : 08-01-2009>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalCitation {
    pub citation_type: CitationType,
    pub law_type: String,
    pub dossier_number: String,
    pub article_number: Option<String>,
    pub sequence_number: Option<String>,
    pub effective_date: Option<String>,
    pub url: Option<String>,
    pub matched_text: String,
    /// Character offsets of `matched_text` in the parsed string.
    pub start_pos: usize,
    pub end_pos: usize,
}

/// An incoming or outgoing amendment between two documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationRecord {
    /// Dossier number of the other document.
    pub dossier_number: String,
    pub publication_date: Option<String>,
    pub modified_articles: Vec<String>,
    pub source_url: Option<String>,
    pub full_title: Option<String>,
}

/// Declaration that a document amends another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentDeclaration {
    /// Dossier number of the amended act.
    pub dossier_number: String,
    #[serde(default)]
    pub modified_articles: Vec<String>,
}

/// Cross-document references of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct References {
    #[serde(default)]
    pub modifies: Vec<ModificationRecord>,
    #[serde(default)]
    pub modified_by: Vec<ModificationRecord>,
    /// Acts this document declares to amend.
    #[serde(default)]
    pub amends: Vec<AmendmentDeclaration>,
}

/// A labelled external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLinks {
    #[serde(default)]
    pub official_links: Vec<Link>,
    #[serde(default)]
    pub parliamentary_work: Vec<Link>,
}

/// Kind of legal act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Loi,
    Decret,
    Arrete,
    Ordonnance,
    Constitution,
    Code,
}

impl DocumentType {
    /// Infer the document type from a title.
    ///
    /// The first act keyword in the title wins.
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        let lower = title.to_lowercase();
        [
            ("constitution", Self::Constitution),
            ("code", Self::Code),
            ("loi", Self::Loi),
            ("décret", Self::Decret),
            ("decret", Self::Decret),
            ("arrêté", Self::Arrete),
            ("arrete", Self::Arrete),
            ("ordonnance", Self::Ordonnance),
        ]
        .into_iter()
        .filter_map(|(word, kind)| find_word(&lower, word).map(|pos| (pos, kind)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, kind)| kind)
    }
}

/// Byte position of `word` in `text` as a whole word.
fn find_word(text: &str, word: &str) -> Option<usize> {
    text.match_indices(word).map(|(pos, _)| pos).find(|&pos| {
        let before = text[..pos].chars().next_back();
        let after = text[pos + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Active,
    Abrogated,
}

/// Descriptive metadata of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_number: Option<String>,
    pub dossier_number: String,
    pub title: Option<String>,
    pub publication_date: Option<String>,
    pub source: Option<String>,
    pub page_number: Option<String>,
    pub effective_date: Option<String>,
    pub end_validity_date: Option<String>,
    pub language: String,
    pub document_type: Option<DocumentType>,
    pub status: DocumentStatus,
    pub official_justel_url: Option<String>,
    pub official_publication_pdf_url: Option<String>,
    pub consolidated_pdf_url: Option<String>,
}

/// Present when the whole document has been repealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbrogationInfo {
    pub is_fully_abrogated: bool,
    pub abrogation_text: Option<String>,
    pub abrogating_citation: Option<LegalCitation>,
    pub abrogation_date: Option<String>,
}

/// Non-fatal problem found while extracting a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    BracketMismatch,
    DanglingFootnoteReference,
    CitationParse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionIssue {
    pub kind: IssueKind,
    pub anchor_id: Option<String>,
    pub detail: String,
}

impl ExtractionIssue {
    #[must_use]
    pub fn new(kind: IssueKind, anchor_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            anchor_id: Some(anchor_id.into()),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessFlags {
    pub all_articles_extracted: bool,
    pub footnotes_linked: bool,
    pub citations_parsed: bool,
    pub bracket_spans_resolved: bool,
    pub hierarchical_structure_complete: bool,
    pub metadata_complete: bool,
    pub preamble_extracted: bool,
    pub is_minimal_document: bool,
    pub is_abrogated_document: bool,
    #[serde(default)]
    pub is_manual_override: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStatistics {
    pub article_count: usize,
    pub footnote_count: usize,
    pub footnote_reference_count: usize,
    pub provision_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub extraction_date: String,
    pub source_file: Option<String>,
    pub parser_version: String,
    #[serde(default)]
    pub statistics: ExtractionStatistics,
    pub completeness_flags: CompletenessFlags,
    #[serde(default)]
    pub issues: Vec<ExtractionIssue>,
}

/// A fully parsed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub document_metadata: DocumentMetadata,
    #[serde(default)]
    pub preamble: Option<String>,
    #[serde(default)]
    pub abrogation_info: Option<AbrogationInfo>,
    pub document_hierarchy: Vec<DocumentNode>,
    #[serde(default)]
    pub references: References,
    #[serde(default)]
    pub external_links: ExternalLinks,
    pub extraction_metadata: ExtractionMetadata,
}

impl ParsedDocument {
    #[must_use]
    pub fn dossier_number(&self) -> &str {
        &self.document_metadata.dossier_number
    }

    /// Every article in document order.
    pub fn articles(&self) -> impl Iterator<Item = &ArticleContent> + '_ {
        forest_articles(&self.document_hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn article(number: &str) -> ArticleContent {
        ArticleContent {
            article_number: number.to_string(),
            anchor_id: format!("art_{number}"),
            main_text_raw: String::new(),
            main_text: String::new(),
            numbered_provisions: Vec::new(),
            footnotes: Vec::new(),
            footnote_references: Vec::new(),
            abrogation_status: None,
            bracket_resolution_skipped: false,
            structured_content_metadata: StructuredContentMetadata::default(),
        }
    }

    #[test]
    fn test_node_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&NodeKind::SousSection).unwrap();
        assert_eq!(json, "\"sous-section\"");
        assert_eq!(NodeKind::SousSection.as_str(), "sous-section");
    }

    #[test]
    fn test_container_label() {
        let node = DocumentNode::container(NodeKind::Chapitre, 2, "CHAPITRE II", "Définitions");
        assert_eq!(node.label, "CHAPITRE II Définitions");

        let bare = DocumentNode::container(NodeKind::Annexe, 1, "ANNEXE", "");
        assert_eq!(bare.label, "ANNEXE");
    }

    #[test]
    fn test_articles_iterates_in_document_order() {
        let mut chapter = DocumentNode::container(NodeKind::Chapitre, 2, "CHAPITRE I", "");
        let mut section = DocumentNode::container(NodeKind::Section, 3, "Section 1", "");
        section.children.push(DocumentNode::article(5, article("1")));
        section.children.push(DocumentNode::article(5, article("2")));
        chapter.children.push(section);
        chapter.children.push(DocumentNode::article(5, article("3")));

        let numbers: Vec<_> = forest_articles(std::slice::from_ref(&chapter))
            .map(|a| a.article_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_article_node_serializes_type_field() {
        let node = DocumentNode::article(5, article("1er"));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "article");
        assert_eq!(value["label"], "Art. 1er");
        assert!(value.get("children").is_none());
    }

    #[test]
    fn test_document_type_from_title() {
        assert_eq!(
            DocumentType::from_title("22 DECEMBRE 2008. - Loi portant des dispositions diverses"),
            Some(DocumentType::Loi)
        );
        assert_eq!(
            DocumentType::from_title("Arrêté du Gouvernement flamand relatif à la loi sur ..."),
            Some(DocumentType::Arrete)
        );
        assert_eq!(
            DocumentType::from_title("Code wallon de l'Action sociale"),
            Some(DocumentType::Code)
        );
        assert_eq!(DocumentType::from_title("Coordination officieuse"), None);
    }

    #[test]
    fn test_footnote_reference_end_position_counts_chars() {
        let reference = FootnoteReference {
            reference_number: "1".to_string(),
            text_position: 4,
            referenced_text: "créé".to_string(),
            bracket_pattern: "[1 créé]1".to_string(),
            law_reference: None,
        };
        assert_eq!(reference.end_position(), 8);
    }
}
