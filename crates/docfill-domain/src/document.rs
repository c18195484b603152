//! Document module - handles for the input documents of a run

use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of an input document, which decides how its text is extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Read as-is and decoded as UTF-8 text
    PlainText,

    /// Text extracted page by page
    Pdf,
}

impl DocumentKind {
    /// Infer the kind from a path's extension
    ///
    /// `.pdf` (any case) is a PDF; everything else, including files without an
    /// extension, is plain text.
    ///
    /// # Examples
    ///
    /// ```
    /// use docfill_domain::DocumentKind;
    ///
    /// assert_eq!(DocumentKind::from_path("report.PDF"), DocumentKind::Pdf);
    /// assert_eq!(DocumentKind::from_path("notes.txt"), DocumentKind::PlainText);
    /// assert_eq!(DocumentKind::from_path("README"), DocumentKind::PlainText);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let is_pdf = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            DocumentKind::Pdf
        } else {
            DocumentKind::PlainText
        }
    }

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::PlainText => "text",
            DocumentKind::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to one input document
///
/// The kind is fixed at construction. Handles are read-only: loading a
/// document never changes its handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle {
    name: String,
    location: PathBuf,
    kind: DocumentKind,
}

impl DocumentHandle {
    /// Create a handle for the document at `location`
    ///
    /// The display name is the final path component, or the whole path when
    /// there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use docfill_domain::{DocumentHandle, DocumentKind};
    ///
    /// let handle = DocumentHandle::new("data/invoice.pdf", DocumentKind::Pdf);
    /// assert_eq!(handle.name(), "invoice.pdf");
    /// assert_eq!(handle.kind(), DocumentKind::Pdf);
    /// ```
    pub fn new(location: impl Into<PathBuf>, kind: DocumentKind) -> Self {
        let location = location.into();
        let name = location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.to_string_lossy().into_owned());

        Self {
            name,
            location,
            kind,
        }
    }

    /// Create a handle whose kind is inferred from the file extension
    pub fn from_path(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let kind = DocumentKind::from_path(&location);
        Self::new(location, kind)
    }

    /// Display name used to correlate output with its source
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem location of the document
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Declared kind of the document
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.location.display(), self.kind)
    }
}
