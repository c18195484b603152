//! Error types for document resolution and loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or loading documents
#[derive(Error, Debug)]
pub enum SourceError {
    /// The location does not exist
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The document set could not be listed
    #[error("Failed to list {}: {source}", path.display())]
    Discovery {
        /// Directory being listed
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Reading the document failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Document location
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// The document bytes are not valid UTF-8 text
    #[error("Failed to decode {} as UTF-8: {message}", path.display())]
    Decode {
        /// Document location
        path: PathBuf,
        /// Decoder message
        message: String,
    },

    /// The PDF could not be parsed or a page could not be extracted
    #[error("Failed to extract PDF {}: {message}", path.display())]
    Pdf {
        /// Document location
        path: PathBuf,
        /// Extractor message, including the failing page when known
        message: String,
    },
}

impl SourceError {
    /// Whether this is a resolution failure rather than a load failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}
