//! Stack-based hierarchy builder.
//!
//! Headings and articles arrive as a flat stream in source order. The builder
//! keeps a stack of open containers: a heading closes every open container
//! that may not hold it, then opens itself under whatever remains. Nodes are
//! kept in an arena until `finish`, so merged headings can be reopened by
//! index without juggling borrows.

use std::collections::HashMap;

use crate::config::label_key;
use crate::error::{ParserError, Result, SourceLocation};
use crate::types::{ArticleContent, DocumentNode, NodeKind};

use super::grammar::{clean_heading_text, HeadingGrammar};

#[derive(Debug)]
struct Slot {
    node: Option<DocumentNode>,
    children: Vec<usize>,
    /// Merge key for containers; `None` for articles.
    key: Option<(NodeKind, String)>,
}

#[derive(Debug)]
struct AnchorEntry {
    parent: Option<usize>,
    slot: usize,
    location: SourceLocation,
}

/// Incremental builder for a document tree.
#[derive(Debug)]
pub struct HierarchyBuilder<'g> {
    grammar: &'g HeadingGrammar,
    slots: Vec<Slot>,
    roots: Vec<usize>,
    stack: Vec<usize>,
    anchors: HashMap<String, AnchorEntry>,
}

impl<'g> HierarchyBuilder<'g> {
    #[must_use]
    pub fn new(grammar: &'g HeadingGrammar) -> Self {
        Self {
            grammar,
            slots: Vec::new(),
            roots: Vec::new(),
            stack: Vec::new(),
            anchors: HashMap::new(),
        }
    }

    fn kind_of(&self, index: usize) -> Option<NodeKind> {
        self.slots[index].node.as_ref().map(|n| n.kind)
    }

    fn label_of(&self, parent: Option<usize>) -> String {
        parent
            .and_then(|index| self.slots[index].node.as_ref())
            .map_or_else(|| "document root".to_string(), |n| n.label.clone())
    }

    fn children_of(&self, parent: Option<usize>) -> &[usize] {
        match parent {
            Some(index) => &self.slots[index].children,
            None => &self.roots,
        }
    }

    fn attach(&mut self, parent: Option<usize>, node: DocumentNode, key: Option<(NodeKind, String)>) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot {
            node: Some(node),
            children: Vec::new(),
            key,
        });
        match parent {
            Some(p) => self.slots[p].children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    /// Close open containers until the top of the stack may hold `kind`.
    fn close_until_fits(&mut self, kind: NodeKind) {
        while let Some(&top) = self.stack.last() {
            if self
                .kind_of(top)
                .is_some_and(|parent| self.grammar.can_contain(parent, kind))
            {
                break;
            }
            self.stack.pop();
        }
    }

    /// Open a container heading.
    ///
    /// A heading whose type and normalized label match an existing sibling
    /// under the same parent reopens that sibling instead of creating a new one.
    pub fn push_heading(&mut self, kind: NodeKind, title_type: &str, title_content: &str) {
        self.close_until_fits(kind);
        let parent = self.stack.last().copied();

        let node = DocumentNode::container(
            kind,
            self.grammar.rank(kind),
            clean_heading_text(title_type),
            clean_heading_text(title_content),
        );
        let key = (kind, label_key(&node.label));

        let existing = self
            .children_of(parent)
            .iter()
            .copied()
            .find(|&child| self.slots[child].key.as_ref() == Some(&key));

        if let Some(index) = existing {
            tracing::debug!(label = %node.label, "merging duplicate heading");
            self.stack.push(index);
            return;
        }

        let index = self.attach(parent, node, Some(key));
        self.stack.push(index);
    }

    /// Attach an article under the innermost open container.
    ///
    /// Identical duplicates under the same container are dropped. An anchor
    /// seen before with different content, or under another container, is a
    /// structural conflict.
    pub fn push_article(&mut self, content: ArticleContent, location: SourceLocation) -> Result<()> {
        self.close_until_fits(NodeKind::Article);
        let parent = self.stack.last().copied();
        if parent.is_none() {
            tracing::debug!(article = %content.article_number, "article attached at document root");
        }

        if let Some(entry) = self.anchors.get(&content.anchor_id) {
            let same_parent = entry.parent == parent;
            let identical = self.slots[entry.slot]
                .node
                .as_ref()
                .and_then(|n| n.article_content.as_ref())
                .is_some_and(|existing| *existing == content);

            if same_parent && identical {
                tracing::debug!(anchor = %content.anchor_id, "dropping identical duplicate article");
                return Ok(());
            }

            let reason = if same_parent {
                format!("anchor {} has differing content", content.anchor_id)
            } else {
                format!(
                    "anchor {} appears under '{}' and '{}'",
                    content.anchor_id,
                    self.label_of(entry.parent),
                    self.label_of(parent)
                )
            };
            return Err(ParserError::StructuralConflict {
                label: format!("Art. {}", content.article_number),
                first: entry.location,
                second: location,
                reason,
            });
        }

        let anchor = content.anchor_id.clone();
        let slot = self.attach(
            parent,
            DocumentNode::article(self.grammar.rank(NodeKind::Article), content),
            None,
        );
        self.anchors.insert(
            anchor,
            AnchorEntry {
                parent,
                slot,
                location,
            },
        );
        Ok(())
    }

    /// Number of articles attached so far.
    #[must_use]
    pub fn article_count(&self) -> usize {
        self.anchors.len()
    }

    /// Assemble the finished forest.
    #[must_use]
    pub fn finish(mut self) -> Vec<DocumentNode> {
        let roots = std::mem::take(&mut self.roots);
        roots
            .into_iter()
            .filter_map(|index| take_node(&mut self.slots, index))
            .collect()
    }
}

fn take_node(slots: &mut [Slot], index: usize) -> Option<DocumentNode> {
    let children = std::mem::take(&mut slots[index].children);
    let mut node = slots[index].node.take()?;
    node.children = children
        .into_iter()
        .filter_map(|child| take_node(slots, child))
        .collect();
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::create_belgian_heading_grammar;
    use crate::types::StructuredContentMetadata;
    use pretty_assertions::assert_eq;

    fn article(number: &str, text: &str) -> ArticleContent {
        ArticleContent {
            article_number: number.to_string(),
            anchor_id: crate::config::anchor_id(number),
            main_text_raw: text.to_string(),
            main_text: String::new(),
            numbered_provisions: Vec::new(),
            footnotes: Vec::new(),
            footnote_references: Vec::new(),
            abrogation_status: None,
            bracket_resolution_skipped: false,
            structured_content_metadata: StructuredContentMetadata::default(),
        }
    }

    fn at(event: usize) -> SourceLocation {
        SourceLocation::new(event, None)
    }

    fn shape(nodes: &[DocumentNode]) -> Vec<String> {
        fn walk(node: &DocumentNode, depth: usize, out: &mut Vec<String>) {
            out.push(format!("{}{}", "  ".repeat(depth), node.label));
            for child in &node.children {
                walk(child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        for node in nodes {
            walk(node, 0, &mut out);
        }
        out
    }

    #[test]
    fn test_nested_headings_and_articles() {
        let grammar = create_belgian_heading_grammar();
        let mut builder = HierarchyBuilder::new(&grammar);
        builder.push_heading(NodeKind::Titre, "TITRE I", "Généralités");
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE I", "");
        builder.push_article(article("1", "a"), at(2)).unwrap();
        builder.push_heading(NodeKind::Section, "Section 1", "");
        builder.push_article(article("2", "b"), at(4)).unwrap();
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE II", "");
        builder.push_article(article("3", "c"), at(6)).unwrap();

        assert_eq!(
            shape(&builder.finish()),
            vec![
                "TITRE I Généralités",
                "  CHAPITRE I",
                "    Art. 1",
                "    Section 1",
                "      Art. 2",
                "  CHAPITRE II",
                "    Art. 3",
            ]
        );
    }

    #[test]
    fn test_higher_heading_closes_lower_levels() {
        let grammar = create_belgian_heading_grammar();
        let mut builder = HierarchyBuilder::new(&grammar);
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE I", "");
        builder.push_heading(NodeKind::SousSection, "Sous-section 1", "");
        builder.push_article(article("1", "a"), at(2)).unwrap();
        builder.push_heading(NodeKind::Titre, "TITRE II", "");
        builder.push_article(article("2", "b"), at(4)).unwrap();

        let forest = builder.finish();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[1].kind, NodeKind::Titre);
        assert_eq!(forest[1].children[0].label, "Art. 2");
    }

    #[test]
    fn test_duplicate_heading_is_merged() {
        let grammar = create_belgian_heading_grammar();
        let mut builder = HierarchyBuilder::new(&grammar);
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE V", "Dispositions finales");
        builder.push_article(article("10", "a"), at(1)).unwrap();
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE VI", "");
        builder.push_article(article("11", "b"), at(3)).unwrap();
        builder.push_heading(NodeKind::Chapitre, "Chapitre V", "Dispositions  finales");
        builder.push_article(article("12", "c"), at(5)).unwrap();

        let forest = builder.finish();
        assert_eq!(forest.len(), 2);
        let numbers: Vec<_> = forest[0]
            .articles()
            .map(|a| a.article_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["10", "12"]);
    }

    #[test]
    fn test_identical_duplicate_article_is_dropped() {
        let grammar = create_belgian_heading_grammar();
        let mut builder = HierarchyBuilder::new(&grammar);
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE I", "");
        builder.push_article(article("1", "même texte"), at(1)).unwrap();
        builder.push_article(article("1", "même texte"), at(2)).unwrap();
        assert_eq!(builder.article_count(), 1);
        assert_eq!(builder.finish()[0].children.len(), 1);
    }

    #[test]
    fn test_differing_duplicate_article_conflicts() {
        let grammar = create_belgian_heading_grammar();
        let mut builder = HierarchyBuilder::new(&grammar);
        builder.push_article(article("4", "version A"), at(0)).unwrap();
        let err = builder
            .push_article(article("4", "version B"), at(1))
            .unwrap_err();
        match err {
            ParserError::StructuralConflict { label, first, second, reason } => {
                assert_eq!(label, "Art. 4");
                assert_eq!(first.event, 0);
                assert_eq!(second.event, 1);
                assert!(reason.contains("differing content"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_anchor_in_two_containers_conflicts() {
        let grammar = create_belgian_heading_grammar();
        let mut builder = HierarchyBuilder::new(&grammar);
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE I", "");
        builder.push_article(article("1", "a"), at(1)).unwrap();
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE II", "");
        let err = builder.push_article(article("1", "a"), at(3)).unwrap_err();
        assert!(err.is_document_scoped());
        assert!(err.to_string().contains("CHAPITRE I"));
    }

    #[test]
    fn test_articles_before_any_heading_sit_at_root() {
        let grammar = create_belgian_heading_grammar();
        let mut builder = HierarchyBuilder::new(&grammar);
        builder.push_article(article("1", "a"), at(0)).unwrap();
        builder.push_heading(NodeKind::Chapitre, "CHAPITRE I", "");
        builder.push_article(article("2", "b"), at(2)).unwrap();

        let forest = builder.finish();
        assert_eq!(forest[0].kind, NodeKind::Article);
        assert_eq!(forest[1].children[0].label, "Art. 2");
    }

    #[test]
    fn test_ranks_come_from_grammar() {
        let grammar = create_belgian_heading_grammar();
        let mut builder = HierarchyBuilder::new(&grammar);
        builder.push_heading(NodeKind::Section, "}Section 2", "Procédure");
        builder.push_article(article("7", "x"), at(1)).unwrap();
        let forest = builder.finish();
        assert_eq!(forest[0].rank, 3);
        assert_eq!(forest[0].title_type, "Section 2");
        assert_eq!(forest[0].children[0].rank, 5);
    }
}
