//! Course material loading.
//!
//! Reads the raw-document directory into memory. Documents are text-bearing
//! exports of the course materials; anything the loader cannot read as text
//! is skipped with a warning.

use crate::error::{DocentError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Supported text-bearing document extensions.
const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// A raw course document, keyed by file name for citations.
#[derive(Debug, Clone)]
pub struct CourseDocument {
    /// File name, retained as the citation source for every chunk.
    pub file_name: String,
    /// Path the document was read from.
    pub path: PathBuf,
    /// Full document text.
    pub text: String,
}

/// Check if path has a supported document extension.
fn is_document_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Count the supported documents visible in the directory, or None if the
/// directory cannot be read.
pub fn count_documents(dir: &Path) -> Option<usize> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_document_file(p))
            .count(),
    )
}

/// Load every readable course document from the given directory.
///
/// Errors if the directory is missing or no loadable document remains;
/// both halt a cold-start index build before anything is written.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_corpus(dir: &Path) -> Result<Vec<CourseDocument>> {
    if !dir.exists() {
        return Err(DocentError::Config(format!(
            "Course material directory not found: {}",
            dir.display()
        )));
    }

    if !dir.is_dir() {
        return Err(DocentError::InvalidInput(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    // Stable ingest order keeps chunk ordering reproducible across builds.
    entries.sort();

    let mut documents = Vec::new();
    for path in entries {
        if !path.is_file() {
            continue;
        }

        if !is_document_file(&path) {
            debug!("Skipping unsupported file: {}", path.display());
            continue;
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => {
                warn!("Skipping empty document: {}", file_name);
            }
            Ok(text) => {
                debug!(chars = text.len(), "Loaded {}", file_name);
                documents.push(CourseDocument {
                    file_name,
                    path,
                    text,
                });
            }
            Err(e) => {
                warn!("Skipping unreadable document {}: {}", file_name, e);
            }
        }
    }

    if documents.is_empty() {
        return Err(DocentError::Config(format!(
            "No course documents found in {}. Add .txt or .md files and retry.",
            dir.display()
        )));
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_document_file() {
        assert!(is_document_file(Path::new("notes.txt")));
        assert!(is_document_file(Path::new("chapter3.MD")));
        assert!(is_document_file(Path::new("/path/to/outline.markdown")));
        assert!(!is_document_file(Path::new("slides.pdf")));
        assert!(!is_document_file(Path::new("Makefile")));
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");

        let err = load_corpus(&missing).unwrap_err();
        assert!(matches!(err, DocentError::Config(_)));
    }

    #[test]
    fn test_empty_directory_is_config_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_corpus(dir.path()).unwrap_err();
        assert!(matches!(err, DocentError::Config(_)));
    }

    #[test]
    fn test_unsupported_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ch3.txt"), "stocks and flows").unwrap();
        std::fs::write(dir.path().join("slides.pdf"), [0x25, 0x50, 0x44, 0x46]).unwrap();

        let docs = load_corpus(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_name, "ch3.txt");
        assert_eq!(docs[0].text, "stocks and flows");
    }

    #[test]
    fn test_only_unsupported_files_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("slides.pdf"), "%PDF").unwrap();

        let err = load_corpus(dir.path()).unwrap_err();
        assert!(matches!(err, DocentError::Config(_)));
    }

    #[test]
    fn test_count_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ch3.txt"), "a").unwrap();
        std::fs::write(dir.path().join("ch5.md"), "b").unwrap();
        std::fs::write(dir.path().join("slides.pdf"), "c").unwrap();

        assert_eq!(count_documents(dir.path()), Some(2));
        assert_eq!(count_documents(&dir.path().join("absent")), None);
    }

    #[test]
    fn test_documents_load_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ch5.txt"), "delays").unwrap();
        std::fs::write(dir.path().join("ch3.txt"), "feedback loops").unwrap();

        let docs = load_corpus(dir.path()).unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["ch3.txt", "ch5.txt"]);
    }
}
