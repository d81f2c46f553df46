//! Command-line interface for the corpus runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use justel_parser::overrides::load_override;
use justel_parser::{process_document, OverrideTable, ParseOptions, SourceDocument};

use crate::config::CorpusConfig;
use crate::error::{CorpusError, Result};
use crate::loader::load_sources;
use crate::runner::{CorpusRunner, ProgressFn};
use crate::writer::{to_json, write_outcome};

/// Justel Corpus - Structural parsing of consolidated Belgian legislation.
#[derive(Parser)]
#[command(name = "justel-corpus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a single source document (markdown, JSON or YAML).
    Parse {
        /// Source file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory of hand-corrected replacement documents
        #[arg(long)]
        overrides_dir: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Parse and link every source document of a directory.
    Corpus {
        /// Directory of source documents
        input_dir: PathBuf,

        /// Output directory (default: $JUSTEL_OUTPUT_DIR or output/)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Directory of hand-corrected replacement documents
        #[arg(long)]
        overrides_dir: Option<PathBuf>,

        /// Maximum number of documents parsed concurrently
        #[arg(short = 'j', long)]
        max_parallel: Option<usize>,

        /// Per-document timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check a replacement document against the tree invariants.
    ValidateOverride {
        /// Replacement document (JSON or YAML)
        file: PathBuf,
    },
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            input,
            output,
            overrides_dir,
            pretty,
        } => parse_command(&input, output.as_deref(), overrides_dir.as_deref(), pretty).await,
        Commands::Corpus {
            input_dir,
            output_dir,
            overrides_dir,
            max_parallel,
            timeout,
            pretty,
        } => {
            let mut config = CorpusConfig::from_env()?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(dir) = overrides_dir {
                config = config.with_overrides_dir(dir);
            }
            if let Some(max_parallel) = max_parallel {
                config = config.with_max_parallel(max_parallel);
            }
            if let Some(secs) = timeout {
                config = config.with_document_timeout(Duration::from_secs(secs));
            }
            if pretty {
                config = config.with_pretty_json(true);
            }
            corpus_command(&input_dir, config.validated()?).await
        }
        Commands::ValidateOverride { file } => validate_override_command(&file),
    }
}

fn require_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(CorpusError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory does not exist: {}", path.display()),
        )));
    }
    Ok(())
}

fn load_overrides(dir: Option<&Path>) -> Result<OverrideTable> {
    match dir {
        Some(dir) => {
            require_dir(dir)?;
            Ok(OverrideTable::load_dir(dir)?)
        }
        None => Ok(OverrideTable::new()),
    }
}

/// Execute the parse command.
async fn parse_command(
    input: &Path,
    output: Option<&Path>,
    overrides_dir: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let overrides = load_overrides(overrides_dir)?;
    let input = input.to_path_buf();
    let document = tokio::task::spawn_blocking(move || {
        let source = SourceDocument::load(&input)?;
        process_document(&source, &overrides, &ParseOptions::new())
    })
    .await??;

    let json = to_json(&document, pretty)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            let statistics = &document.extraction_metadata.statistics;
            println!(
                "{} {}",
                style("Parsed").bold(),
                style(document.dossier_number()).cyan()
            );
            println!("  Articles: {}", statistics.article_count);
            println!("  Footnotes: {}", statistics.footnote_count);
            let issues = document.extraction_metadata.issues.len();
            if issues > 0 {
                println!("  Issues: {}", style(issues).yellow().bold());
            }
            println!("{} {}", style("Saved to:").green().bold(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Execute the corpus command.
async fn corpus_command(input_dir: &Path, config: CorpusConfig) -> Result<()> {
    require_dir(input_dir)?;
    let overrides = load_overrides(config.overrides_dir.as_deref())?;

    let dir = input_dir.to_path_buf();
    let sources = tokio::task::spawn_blocking(move || load_sources(&dir)).await??;

    println!(
        "{} {} documents from {}",
        style("Parsing").bold(),
        style(sources.len()).cyan(),
        input_dir.display()
    );

    let pb = ProgressBar::new(sources.len() as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template"),
    );
    let tick = pb.clone();
    let progress: ProgressFn = Arc::new(move |dossier: &str| {
        tick.set_message(dossier.to_string());
        tick.inc(1);
    });

    let outcome = CorpusRunner::new(&config)
        .with_overrides(Arc::new(overrides))
        .with_progress(progress)
        .run(sources)
        .await;
    pb.finish_and_clear();
    let outcome = outcome?;

    let paths = write_outcome(&outcome, &config.output_dir, config.pretty_json)?;

    let report = &outcome.report;
    println!("  Parsed: {}", style(report.parsed).green());
    if report.overridden > 0 {
        println!("  Manual overrides: {}", report.overridden);
    }
    if report.documents_with_issues > 0 {
        println!(
            "  Documents with issues: {}",
            style(report.documents_with_issues).yellow().bold()
        );
    }
    for failure in &report.failures {
        println!(
            "  {} {}: {}",
            style("Failed").red().bold(),
            failure.dossier_number,
            failure.reason
        );
    }
    for unresolved in &report.link.unresolved {
        println!(
            "  {} {} amends unknown {}",
            style("Unresolved").yellow(),
            unresolved.source_dossier,
            unresolved.target_dossier
        );
    }
    println!();
    println!(
        "{} {} files in {}",
        style("Saved").green().bold(),
        paths.len(),
        config.output_dir.display()
    );
    Ok(())
}

/// Execute the validate-override command.
fn validate_override_command(file: &Path) -> Result<()> {
    let document = load_override(file)?;
    println!(
        "{} {} ({} articles)",
        style("Valid override").green().bold(),
        style(document.dossier_number()).cyan(),
        document.articles().count()
    );
    Ok(())
}
