//! End-to-end tests for the parser: markdown or event stream in, linked
//! document model out.

use std::path::Path;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use justel_parser::types::{DocumentType, IssueKind, ModificationRecord, ModificationType, NodeKind};
use justel_parser::{
    link_documents, parse_document, process_document, DocumentNode, OverrideTable, ParseOptions,
    ParsedDocument, ParserError, SourceDocument, SourceEvent,
};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn options() -> ParseOptions {
    ParseOptions::new().with_generated_at(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

fn labels(nodes: &[DocumentNode]) -> Vec<String> {
    nodes.iter().map(|n| n.label.clone()).collect()
}

fn parse_fixture() -> ParsedDocument {
    let source = SourceDocument::load(&fixture("2014-02-27_12.md")).expect("fixture loads");
    parse_document(&source, &options()).expect("fixture parses")
}

#[test]
fn test_markdown_fixture_metadata() {
    let document = parse_fixture();
    let metadata = &document.document_metadata;

    assert_eq!(metadata.dossier_number, "2014-02-27/12");
    assert_eq!(metadata.document_number.as_deref(), Some("2014027148"));
    assert_eq!(metadata.publication_date.as_deref(), Some("2014-03-21"));
    assert_eq!(metadata.effective_date.as_deref(), Some("2015-01-01"));
    assert_eq!(metadata.document_type, Some(DocumentType::Decret));
    assert_eq!(
        metadata.official_justel_url.as_deref(),
        Some("https://www.ejustice.just.fgov.be/eli/decret/2014/02/27/2014027148/justel")
    );
    assert!(document.preamble.is_some());
    assert_eq!(
        document.extraction_metadata.source_file.as_deref(),
        Some("2014-02-27_12.md")
    );
}

#[test]
fn test_markdown_fixture_hierarchy() {
    let document = parse_fixture();
    let forest = &document.document_hierarchy;

    assert_eq!(
        labels(forest),
        vec!["CHAPITRE Ier Dispositions générales", "CHAPITRE II Des aides"]
    );
    assert_eq!(labels(&forest[0].children), vec!["Art. 1er", "Art. 2"]);
    assert_eq!(
        labels(&forest[1].children),
        vec!["Section 1re Octroi", "Section 2 Liquidation"]
    );
    assert_eq!(
        labels(&forest[1].children[1].children),
        vec!["Art. 4", "Art. 5 WALLONNE", "Art. 6"]
    );
    assert!(forest[1].children.iter().all(|n| n.kind == NodeKind::Section));

    let anchors: Vec<_> = document.articles().map(|a| a.anchor_id.as_str()).collect();
    assert_eq!(
        anchors,
        vec!["art_1er", "art_2", "art_3", "art_4", "art_5_WALLONNE", "art_6"]
    );
}

#[test]
fn test_markdown_fixture_articles() {
    let document = parse_fixture();
    let articles: Vec<_> = document.articles().collect();

    let definitions = articles[1];
    assert_eq!(definitions.numbered_provisions.len(), 3);
    assert_eq!(definitions.numbered_provisions[1].sub_items.len(), 2);
    assert_eq!(definitions.structured_content_metadata.paragraph_count, 2);
    assert_eq!(definitions.structured_content_metadata.provision_count, 5);
    assert_eq!(
        definitions.footnotes[0].modification_type,
        Some(ModificationType::Replacement)
    );
    assert_eq!(
        definitions.footnotes[0].direct_url.as_deref(),
        Some("https://www.ejustice.just.fgov.be/cgi_loi/change_lg.pl?language=fr&la=F&cn=2016121507&table_name=loi")
    );

    let nested = articles[2];
    assert_eq!(
        nested.main_text_raw,
        "Le ministre octroie les aides dans la limite des crédits budgétaires."
    );
    let spans: Vec<_> = nested
        .footnote_references
        .iter()
        .map(|r| (r.reference_number.as_str(), r.text_position))
        .collect();
    assert_eq!(spans, vec![("1", 0), ("2", 30)]);
    assert!(nested.footnote_references.iter().all(|r| r.law_reference.is_some()));

    assert_eq!(articles[3].abrogation_status.as_deref(), Some("abrogé"));
    assert_eq!(articles[4].main_text_raw, "Les aides sont liquidées en une tranche.");

    let broken = articles[5];
    assert!(broken.bracket_resolution_skipped);
    assert_eq!(broken.main_text_raw, "Le texte [1 contient une erreur]2 de balisage.");
}

#[test]
fn test_markdown_fixture_extraction_metadata() {
    let document = parse_fixture();
    let extraction = &document.extraction_metadata;

    assert_eq!(extraction.statistics.article_count, 6);
    assert_eq!(extraction.statistics.footnote_count, 3);
    assert_eq!(extraction.statistics.footnote_reference_count, 3);
    assert_eq!(extraction.issues.len(), 1);
    assert_eq!(extraction.issues[0].kind, IssueKind::BracketMismatch);
    assert_eq!(extraction.issues[0].anchor_id.as_deref(), Some("art_6"));

    let flags = &extraction.completeness_flags;
    assert!(!flags.bracket_spans_resolved);
    assert!(flags.footnotes_linked);
    assert!(flags.citations_parsed);
    assert!(flags.metadata_complete);
    assert!(flags.preamble_extracted);
    assert!(!flags.is_abrogated_document);
}

#[test]
fn test_three_chapters_keep_six_articles_in_order() {
    let mut events = Vec::new();
    for (chapter, articles) in [("I", ["1", "2"]), ("II", ["3", "4"]), ("III", ["5", "6"])] {
        events.push(SourceEvent::heading(format!("CHAPITRE {chapter}"), ""));
        for number in articles {
            events.push(SourceEvent::article(number, format!("Article {number}.")));
        }
    }
    let document = parse_document(&SourceDocument::new("X").with_events(events), &options()).unwrap();

    assert_eq!(document.document_hierarchy.len(), 3);
    assert!(document
        .document_hierarchy
        .iter()
        .all(|chapter| chapter.children.len() == 2));
    let numbers: Vec<_> = document.articles().map(|a| a.article_number.as_str()).collect();
    assert_eq!(numbers, vec!["1", "2", "3", "4", "5", "6"]);
}

#[test]
fn test_repeated_chapter_is_merged_in_source_order() {
    let events = vec![
        SourceEvent::heading("CHAPITRE V", "Dispositions finales"),
        SourceEvent::article("40", "A."),
        SourceEvent::heading("CHAPITRE VI", "Entrée en vigueur"),
        SourceEvent::article("41", "B."),
        SourceEvent::heading("CHAPITRE V", "Dispositions finales"),
        SourceEvent::article("42", "C."),
    ];
    let document = parse_document(&SourceDocument::new("X").with_events(events), &options()).unwrap();

    assert_eq!(
        labels(&document.document_hierarchy),
        vec!["CHAPITRE V Dispositions finales", "CHAPITRE VI Entrée en vigueur"]
    );
    assert_eq!(
        labels(&document.document_hierarchy[0].children),
        vec!["Art. 40", "Art. 42"]
    );
}

#[test]
fn test_conflict_then_manual_override() {
    let conflicting = SourceDocument::new("2001-01-01/1").with_events(vec![
        SourceEvent::heading("CHAPITRE I", ""),
        SourceEvent::article("1", "Première version."),
        SourceEvent::heading("CHAPITRE II", ""),
        SourceEvent::article("1", "Seconde version."),
    ]);
    let err = parse_document(&conflicting, &options()).unwrap_err();
    assert!(matches!(err, ParserError::StructuralConflict { .. }));

    let corrected = SourceDocument::new("2001-01-01/1").with_events(vec![
        SourceEvent::heading("CHAPITRE I", ""),
        SourceEvent::article("1", "Première version."),
        SourceEvent::heading("CHAPITRE II", ""),
        SourceEvent::article("1bis", "Seconde version."),
    ]);
    let replacement = parse_document(&corrected, &options()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("2001-01-01_1.json"),
        serde_json::to_string_pretty(&replacement).unwrap(),
    )
    .unwrap();
    let overrides = OverrideTable::load_dir(dir.path()).unwrap();

    let document = process_document(&conflicting, &overrides, &options()).unwrap();
    assert!(document.extraction_metadata.completeness_flags.is_manual_override);
    assert_eq!(document.document_hierarchy, replacement.document_hierarchy);
}

#[test]
fn test_linking_two_documents() {
    let a = SourceDocument::new("X");
    let mut b = SourceDocument::new("Y").with_amendment("X", ["1", "4"]);
    b.metadata.publication_date = Some("2020-01-01".to_string());

    let parsed = vec![
        parse_document(&a, &options()).unwrap(),
        parse_document(&b, &options()).unwrap(),
    ];
    let (linked, report) = link_documents(parsed);

    assert!(report.is_clean());
    assert_eq!(
        linked[0].references.modified_by,
        vec![ModificationRecord {
            dossier_number: "Y".to_string(),
            publication_date: Some("2020-01-01".to_string()),
            modified_articles: vec!["1".to_string(), "4".to_string()],
            source_url: None,
            full_title: None,
        }]
    );
    assert_eq!(linked[1].references.modifies.len(), 1);
    assert_eq!(linked[1].references.modifies[0].dossier_number, "X");
    assert_eq!(linked[1].references.modifies[0].modified_articles, vec!["1", "4"]);
}

#[test]
fn test_json_source_with_classified_headings() {
    let json = r#"{
        "dossier_number": "2008-12-22/33",
        "metadata": {"title": "22 DECEMBRE 2008. - Loi portant des dispositions diverses"},
        "events": [
            {"event": "heading", "type": "titre", "title_type": "TITRE III", "title_content": "Finances", "rank": 1},
            {"event": "heading", "title_type": "CHAPITRE 1er", "title_content": "Impôts"},
            {"event": "article", "number": "105", "body": "Le présent article entre en vigueur le 8 janvier 2009."}
        ]
    }"#;
    let source = SourceDocument::from_json(json).unwrap();
    let document = parse_document(&source, &options()).unwrap();

    let titre = &document.document_hierarchy[0];
    assert_eq!((titre.kind, titre.rank), (NodeKind::Titre, 1));
    assert_eq!((titre.children[0].kind, titre.children[0].rank), (NodeKind::Chapitre, 2));
    assert_eq!(titre.children[0].children[0].rank, 5);
    assert_eq!(document.document_metadata.document_type, Some(DocumentType::Loi));
}

#[test]
fn test_serialized_shape() {
    let document = parse_fixture();
    let value = serde_json::to_value(&document).unwrap();

    assert_eq!(value["document_hierarchy"][0]["type"], "chapitre");
    assert_eq!(value["document_hierarchy"][0]["children"][1]["type"], "article");
    assert!(value["document_hierarchy"][0]["children"][1]["article_content"]["main_text"]
        .as_str()
        .is_some_and(|html| html.starts_with("<article class=\"legal-article\" id=\"art_2\"")));
    assert!(value["references"]["modifies"].is_array());
    assert!(value["references"]["modified_by"].is_array());
    assert!(value["extraction_metadata"]["completeness_flags"].is_object());
}
