//! Corpus runs over real source files.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use justel_corpus::loader::load_sources;
use justel_corpus::writer::write_outcome;
use justel_corpus::{run_corpus, CorpusConfig, CorpusReport, CorpusRunner};
use justel_parser::{parse_document, OverrideTable, ParseOptions, SourceDocument, SourceEvent};

fn sources_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sources")
}

fn conflicting(dossier: &str) -> SourceDocument {
    SourceDocument::new(dossier).with_events(vec![
        SourceEvent::heading("CHAPITRE I", ""),
        SourceEvent::article("1", "Première version."),
        SourceEvent::heading("CHAPITRE II", ""),
        SourceEvent::article("1", "Seconde version."),
    ])
}

#[tokio::test]
async fn test_run_corpus_links_fixture_documents() {
    let sources = load_sources(&sources_dir()).unwrap();
    let outcome = run_corpus(sources, Arc::new(OverrideTable::new()), &CorpusConfig::default())
        .await
        .unwrap();

    let dossiers: Vec<_> = outcome.documents.iter().map(|d| d.dossier_number()).collect();
    assert_eq!(dossiers, vec!["2008-12-22/33", "2016-01-15/17"]);

    let loi = &outcome.documents[0];
    assert_eq!(loi.references.modified_by.len(), 1);
    let record = &loi.references.modified_by[0];
    assert_eq!(record.dossier_number, "2016-01-15/17");
    assert_eq!(record.publication_date.as_deref(), Some("2016-02-10"));
    assert_eq!(record.modified_articles, vec!["105"]);

    let arrete = &outcome.documents[1];
    assert_eq!(arrete.references.modifies.len(), 1);
    assert_eq!(arrete.references.modifies[0].dossier_number, "2008-12-22/33");

    let report = &outcome.report;
    assert_eq!(report.total, 2);
    assert_eq!(report.parsed, 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.link.unresolved.len(), 1);
    assert_eq!(report.link.unresolved[0].target_dossier, "1999-01-01/1");
}

#[tokio::test]
async fn test_conflict_fails_only_its_document() {
    let sources = vec![
        SourceDocument::new("2020-01-01/1").with_events(vec![SourceEvent::article("1", "Texte.")]),
        conflicting("2020-01-01/2"),
        SourceDocument::new("2020-01-01/3").with_events(vec![SourceEvent::article("1", "Texte.")]),
    ];
    let outcome = run_corpus(sources, Arc::new(OverrideTable::new()), &CorpusConfig::default())
        .await
        .unwrap();

    let dossiers: Vec<_> = outcome.documents.iter().map(|d| d.dossier_number()).collect();
    assert_eq!(dossiers, vec!["2020-01-01/1", "2020-01-01/3"]);
    assert_eq!(outcome.report.failures.len(), 1);
    assert_eq!(outcome.report.failures[0].dossier_number, "2020-01-01/2");
    assert!(outcome.report.failures[0].reason.contains("structural conflict"));
}

#[tokio::test]
async fn test_override_replaces_conflicting_document() {
    let fixed = SourceDocument::new("2020-01-01/2").with_events(vec![
        SourceEvent::heading("CHAPITRE I", ""),
        SourceEvent::article("1", "Première version."),
        SourceEvent::heading("CHAPITRE II", ""),
        SourceEvent::article("1bis", "Seconde version."),
    ]);
    let replacement = parse_document(&fixed, &ParseOptions::default()).unwrap();
    let overrides = OverrideTable::from_documents([replacement]).unwrap();

    let outcome = run_corpus(
        vec![conflicting("2020-01-01/2")],
        Arc::new(overrides),
        &CorpusConfig::default(),
    )
    .await
    .unwrap();

    assert!(outcome.report.failures.is_empty());
    assert_eq!(outcome.report.overridden, 1);
    assert!(outcome.documents[0]
        .extraction_metadata
        .completeness_flags
        .is_manual_override);
}

#[tokio::test]
async fn test_single_slot_keeps_order_and_reports_progress() {
    let sources: Vec<_> = (1..=12)
        .map(|n| {
            SourceDocument::new(format!("2020-01-01/{n}"))
                .with_events(vec![SourceEvent::article("1", format!("Texte {n}."))])
        })
        .collect();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let outcome = CorpusRunner::new(&CorpusConfig::default().with_max_parallel(1))
        .with_progress(Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .run(sources)
        .await
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 12);
    let expected: Vec<String> = (1..=12).map(|n| format!("2020-01-01/{n}")).collect();
    let dossiers: Vec<String> = outcome
        .documents
        .iter()
        .map(|d| d.dossier_number().to_string())
        .collect();
    assert_eq!(dossiers, expected);
}

#[tokio::test]
async fn test_shared_options_make_runs_reproducible() {
    async fn run(options: ParseOptions) -> Vec<justel_parser::ParsedDocument> {
        CorpusRunner::new(&CorpusConfig::default())
            .with_options(options)
            .run(load_sources(&sources_dir()).unwrap())
            .await
            .unwrap()
            .documents
    }

    let options = ParseOptions::default();
    let first = run(options.clone()).await;
    let second = run(options).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_written_output() {
    let out = tempfile::tempdir().unwrap();
    let sources = load_sources(&sources_dir()).unwrap();
    let outcome = run_corpus(sources, Arc::new(OverrideTable::new()), &CorpusConfig::default())
        .await
        .unwrap();

    let paths = write_outcome(&outcome, out.path(), true).unwrap();
    assert_eq!(paths.len(), 3);
    assert!(out.path().join("2008-12-22_33.json").is_file());
    assert!(out.path().join("2016-01-15_17.json").is_file());

    let report: CorpusReport = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("corpus_report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report, outcome.report);
}
