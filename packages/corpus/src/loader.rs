//! Discovery and loading of source documents.

use std::path::{Path, PathBuf};

use justel_parser::SourceDocument;

use crate::error::Result;

/// Extensions recognized as source documents.
pub const SOURCE_EXTENSIONS: &[&str] = &["md", "json", "yaml", "yml"];

fn is_source_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// List the source files of a directory, sorted by path.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_source_file(path))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load every source document of a directory in path order.
pub fn load_sources(dir: &Path) -> Result<Vec<SourceDocument>> {
    let paths = discover_sources(dir)?;
    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        let source = SourceDocument::load(path)?;
        tracing::debug!(
            dossier = %source.dossier_number,
            path = %path.display(),
            events = source.events.len(),
            "loaded source"
        );
        sources.push(source);
    }
    tracing::info!(count = sources.len(), dir = %dir.display(), "loaded sources");
    Ok(sources)
}
