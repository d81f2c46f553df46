//! Declarative heading grammar.
//!
//! Each structural type is described by a `NodeSpec`: the keywords that
//! introduce it, its canonical rank, and the types it may directly contain.
//! New heading conventions are added by registering specs, not by touching
//! the builder.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::types::NodeKind;

/// Declarative specification of one structural type.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub kind: NodeKind,

    /// Fixed ordinal; lower ranks sit higher in the tree.
    pub rank: u8,

    /// Uppercase keywords that open a heading of this type, matched as a prefix.
    pub keywords: Vec<String>,

    /// Types this one may directly contain.
    pub children: Vec<NodeKind>,
}

impl NodeSpec {
    #[must_use]
    pub fn new(kind: NodeKind, rank: u8) -> Self {
        Self {
            kind,
            rank,
            keywords: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeKind>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    #[must_use]
    pub fn can_contain(&self, kind: NodeKind) -> bool {
        self.children.contains(&kind)
    }

    /// Length of the longest keyword that introduces `title_type`, if any.
    fn match_len(&self, normalized: &str) -> Option<usize> {
        self.keywords
            .iter()
            .filter(|keyword| {
                normalized.strip_prefix(keyword.as_str()).is_some_and(|rest| {
                    keyword.ends_with('.') || !rest.chars().next().is_some_and(char::is_alphabetic)
                })
            })
            .map(String::len)
            .max()
    }
}

/// Registry of node specifications.
#[derive(Debug, Clone)]
pub struct HeadingGrammar {
    specs: HashMap<NodeKind, NodeSpec>,
    fallback: NodeKind,
}

impl HeadingGrammar {
    /// Create an empty grammar; unknown headings classify as `fallback`.
    #[must_use]
    pub fn new(fallback: NodeKind) -> Self {
        Self {
            specs: HashMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, spec: NodeSpec) {
        self.specs.insert(spec.kind, spec);
    }

    #[must_use]
    pub fn get_spec(&self, kind: NodeKind) -> Option<&NodeSpec> {
        self.specs.get(&kind)
    }

    #[must_use]
    pub fn fallback(&self) -> NodeKind {
        self.fallback
    }

    /// Canonical rank of a type.
    #[must_use]
    pub fn rank(&self, kind: NodeKind) -> u8 {
        self.specs.get(&kind).map_or(u8::MAX, |s| s.rank)
    }

    /// Whether `parent` may directly contain `child`.
    #[must_use]
    pub fn can_contain(&self, parent: NodeKind, child: NodeKind) -> bool {
        self.specs
            .get(&parent)
            .is_some_and(|spec| spec.can_contain(child))
    }

    /// Classify a heading by its `title_type` ("CHAPITRE II", "Sous-section 1re", ...).
    ///
    /// The longest matching keyword wins. Returns `None` when no keyword matches.
    #[must_use]
    pub fn classify(&self, title_type: &str) -> Option<NodeKind> {
        let normalized = normalize_title_type(title_type);
        let mut candidates: Vec<(usize, NodeKind)> = self
            .specs
            .values()
            .filter_map(|spec| spec.match_len(&normalized).map(|len| (len, spec.kind)))
            .collect();
        // Longest keyword first; ties resolved by kind for a stable result.
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        candidates.first().map(|(_, kind)| *kind)
    }
}

fn normalize_title_type(title_type: &str) -> String {
    clean_heading_text(title_type)
        .nfc()
        .collect::<String>()
        .trim_start_matches(['[', '*', ' '])
        .to_uppercase()
}

/// Remove unmatched braces left over from markup conversion.
///
/// When `{` and `}` are unbalanced, a leading `}` and a trailing `{` are dropped.
#[must_use]
pub fn clean_heading_text(text: &str) -> String {
    let trimmed = text.trim();
    let opens = trimmed.matches('{').count();
    let closes = trimmed.matches('}').count();
    if opens == closes {
        return trimmed.to_string();
    }
    trimmed
        .trim_start_matches('}')
        .trim_end_matches('{')
        .trim()
        .to_string()
}

/// Grammar for consolidated Belgian legislation.
///
/// ```text
/// livre (0)
/// ├── titre (1) / annexe (1)
/// │   └── chapitre (2)
/// │       └── section (3)
/// │           └── sous-section (4)
/// │               └── article (5)
/// ```
///
/// Every container may also hold articles directly, and may skip levels.
#[must_use]
pub fn create_belgian_heading_grammar() -> HeadingGrammar {
    use NodeKind::{Annexe, Article, Chapitre, Livre, Section, SousSection, Titre};

    let mut grammar = HeadingGrammar::new(Section);

    grammar.register(
        NodeSpec::new(Livre, 0)
            .with_keywords(["LIVRE"])
            .with_children([Titre, Annexe, Chapitre, Section, SousSection, Article]),
    );
    grammar.register(
        NodeSpec::new(Titre, 1)
            .with_keywords(["TITRE"])
            .with_children([Chapitre, Section, SousSection, Article]),
    );
    grammar.register(
        NodeSpec::new(Annexe, 1)
            .with_keywords(["ANNEXE"])
            .with_children([Chapitre, Section, SousSection, Article]),
    );
    grammar.register(
        NodeSpec::new(Chapitre, 2)
            .with_keywords(["CHAPITRE", "CHAP."])
            .with_children([Section, SousSection, Article]),
    );
    grammar.register(
        NodeSpec::new(Section, 3)
            .with_keywords(["SECTION", "SECT."])
            .with_children([SousSection, Article]),
    );
    grammar.register(
        NodeSpec::new(SousSection, 4)
            .with_keywords(["SOUS-SECTION", "SOUS SECTION", "SOUS-SECT."])
            .with_children([Article]),
    );
    grammar.register(NodeSpec::new(Article, 5).with_keywords(["ART.", "ARTICLE"]));

    grammar
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_headings() {
        let grammar = create_belgian_heading_grammar();
        assert_eq!(grammar.classify("CHAPITRE II"), Some(NodeKind::Chapitre));
        assert_eq!(grammar.classify("Chapitre Ier."), Some(NodeKind::Chapitre));
        assert_eq!(grammar.classify("TITRE III"), Some(NodeKind::Titre));
        assert_eq!(grammar.classify("Section 2bis"), Some(NodeKind::Section));
        assert_eq!(grammar.classify("Sous-section 1re"), Some(NodeKind::SousSection));
        assert_eq!(grammar.classify("LIVRE 1er"), Some(NodeKind::Livre));
        assert_eq!(grammar.classify("ANNEXE 2"), Some(NodeKind::Annexe));
        assert_eq!(grammar.classify("}CHAPITRE V"), Some(NodeKind::Chapitre));
        assert_eq!(grammar.classify("Art. 5"), Some(NodeKind::Article));
    }

    #[test]
    fn test_keyword_must_end_at_word_boundary() {
        let grammar = create_belgian_heading_grammar();
        assert_eq!(grammar.classify("SECTIONNEMENT"), None);
        assert_eq!(grammar.classify("Dispositions finales"), None);
        assert_eq!(grammar.fallback(), NodeKind::Section);
    }

    #[test]
    fn test_ranks_and_containment() {
        let grammar = create_belgian_heading_grammar();
        assert_eq!(grammar.rank(NodeKind::Livre), 0);
        assert_eq!(grammar.rank(NodeKind::Annexe), 1);
        assert_eq!(grammar.rank(NodeKind::SousSection), 4);
        assert_eq!(grammar.rank(NodeKind::Article), 5);

        assert!(grammar.can_contain(NodeKind::Chapitre, NodeKind::Section));
        assert!(grammar.can_contain(NodeKind::Chapitre, NodeKind::Article));
        assert!(!grammar.can_contain(NodeKind::Section, NodeKind::Chapitre));
        assert!(!grammar.can_contain(NodeKind::Chapitre, NodeKind::Chapitre));
        assert!(!grammar.can_contain(NodeKind::Article, NodeKind::Article));
    }

    #[test]
    fn test_containment_follows_rank_order() {
        let grammar = create_belgian_heading_grammar();
        let kinds = [
            NodeKind::Livre,
            NodeKind::Titre,
            NodeKind::Annexe,
            NodeKind::Chapitre,
            NodeKind::Section,
            NodeKind::SousSection,
            NodeKind::Article,
        ];
        for parent in kinds {
            for child in kinds {
                if grammar.can_contain(parent, child) {
                    assert!(grammar.rank(parent) < grammar.rank(child), "{parent:?} > {child:?}");
                }
            }
        }
    }

    #[test]
    fn test_clean_heading_text() {
        assert_eq!(clean_heading_text("}CHAPITRE II"), "CHAPITRE II");
        assert_eq!(clean_heading_text("Dispositions {"), "Dispositions");
        assert_eq!(clean_heading_text("{balanced}"), "{balanced}");
    }

    #[test]
    fn test_custom_node_registration() {
        let mut grammar = create_belgian_heading_grammar();
        grammar.register(
            NodeSpec::new(NodeKind::Section, 3)
                .with_keywords(["SECTION", "PARTIE"])
                .with_children([NodeKind::SousSection, NodeKind::Article]),
        );
        assert_eq!(grammar.classify("PARTIE 3"), Some(NodeKind::Section));
    }
}
