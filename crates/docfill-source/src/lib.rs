//! Docfill Document Source
//!
//! Resolves input locations to [`DocumentHandle`]s and loads their text.
//!
//! # Document kinds
//!
//! - **Plain text**: the whole file, decoded as UTF-8
//! - **PDF**: pages 1..N extracted in order and concatenated; a failure on
//!   any page fails the document
//!
//! Loading never caches: every [`DocumentLoader::load`] call re-reads the
//! file, so a document deleted after discovery fails at load time.
//!
//! # Examples
//!
//! ```no_run
//! use docfill_source::{DocumentSet, FileSystemSource};
//! use docfill_domain::DocumentLoader;
//!
//! # async fn example() -> Result<(), docfill_source::SourceError> {
//! let source = FileSystemSource::new();
//! let documents = source.discover(&DocumentSet::Directory("./data".into()))?;
//!
//! for document in &documents {
//!     let text = source.load(document).await?;
//!     println!("{}: {} chars", document.name(), text.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod pdf;
mod text;

pub use error::SourceError;

use async_trait::async_trait;
use docfill_domain::{DocumentHandle, DocumentKind, DocumentLoader};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the documents of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSet {
    /// A single file
    File(PathBuf),

    /// Every regular file directly inside a directory (non-recursive)
    Directory(PathBuf),
}

impl fmt::Display for DocumentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSet::File(path) | DocumentSet::Directory(path) => {
                write!(f, "{}", path.display())
            }
        }
    }
}

/// Document source backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemSource;

impl FileSystemSource {
    /// Create a new filesystem source
    pub fn new() -> Self {
        Self
    }

    /// Resolve a location with a declared kind into a handle
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] if nothing exists at `location`.
    pub fn resolve(
        &self,
        kind: DocumentKind,
        location: impl Into<PathBuf>,
    ) -> Result<DocumentHandle, SourceError> {
        let location = location.into();
        if !location.exists() {
            return Err(SourceError::NotFound(location));
        }
        Ok(DocumentHandle::new(location, kind))
    }

    /// Resolve a location, inferring its kind from the extension
    pub fn resolve_path(&self, location: impl Into<PathBuf>) -> Result<DocumentHandle, SourceError> {
        let location = location.into();
        let kind = DocumentKind::from_path(&location);
        self.resolve(kind, location)
    }

    /// Enumerate the documents of a set
    ///
    /// Directory entries are sorted by file name so that the enumeration
    /// order (and therefore dispatch order) is stable. Subdirectories are
    /// skipped.
    pub fn discover(&self, set: &DocumentSet) -> Result<Vec<DocumentHandle>, SourceError> {
        let documents = match set {
            DocumentSet::File(path) => vec![self.resolve_path(path.clone())?],
            DocumentSet::Directory(dir) => self.discover_directory(dir)?,
        };

        for document in &documents {
            debug!(document = %document, "Document found");
        }
        info!("Resolved {} document(s)", documents.len());

        Ok(documents)
    }

    fn discover_directory(&self, dir: &Path) -> Result<Vec<DocumentHandle>, SourceError> {
        if !dir.exists() {
            return Err(SourceError::NotFound(dir.to_path_buf()));
        }

        let entries = std::fs::read_dir(dir).map_err(|source| SourceError::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SourceError::Discovery {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "Skipping non-file entry");
            }
        }
        paths.sort();

        paths.into_iter().map(|path| self.resolve_path(path)).collect()
    }
}

#[async_trait]
impl DocumentLoader for FileSystemSource {
    type Error = SourceError;

    async fn load(&self, document: &DocumentHandle) -> Result<String, SourceError> {
        match document.kind() {
            DocumentKind::PlainText => text::load_text(document.location()).await,
            DocumentKind::Pdf => pdf::load_pdf(document.location()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_missing_location() {
        let source = FileSystemSource::new();
        let result = source.resolve(DocumentKind::PlainText, "/definitely/not/here.txt");
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_resolve_keeps_declared_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.pdf");
        fs::write(&path, "not really a pdf").unwrap();

        let source = FileSystemSource::new();
        let handle = source.resolve(DocumentKind::PlainText, &path).unwrap();
        assert_eq!(handle.kind(), DocumentKind::PlainText);
        assert_eq!(handle.name(), "data.pdf");
    }

    #[test]
    fn test_discover_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one.txt");
        fs::write(&path, "x").unwrap();

        let source = FileSystemSource::new();
        let documents = source.discover(&DocumentSet::File(path)).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].name(), "one.txt");
    }

    #[test]
    fn test_discover_missing_directory() {
        let source = FileSystemSource::new();
        let result = source.discover(&DocumentSet::Directory("/no/such/dir".into()));
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_load_decode_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.txt");
        fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();

        let source = FileSystemSource::new();
        let handle = source.resolve_path(&path).unwrap();
        let result = source.load(&handle).await;
        assert!(matches!(result, Err(SourceError::Decode { .. })));
    }
}
