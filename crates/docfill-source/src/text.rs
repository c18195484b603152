//! Plain-text loading.

use crate::SourceError;
use std::path::Path;
use tracing::debug;

/// Read the whole file and decode it as UTF-8, with no further interpretation.
pub(crate) async fn load_text(path: &Path) -> Result<String, SourceError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| io_error(path, source))?;

    debug!(path = %path.display(), bytes = bytes.len(), "Read plain-text document");

    String::from_utf8(bytes).map_err(|e| SourceError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Wrap a read failure with the document location.
pub(crate) fn io_error(path: &Path, source: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.to_path_buf(),
        source,
    }
}
