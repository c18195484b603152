//! PDF text loading.
//!
//! Uses lopdf to walk pages 1..N in order and extract each page's text.

use crate::text::io_error;
use crate::SourceError;
use lopdf::Document;
use std::path::Path;
use tracing::debug;

/// Load a PDF and concatenate the text of every page in page order.
///
/// A failure on any page fails the whole document.
pub(crate) async fn load_pdf(path: &Path) -> Result<String, SourceError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| io_error(path, source))?;

    // Parsing is CPU-bound
    let owned_path = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_pages(&owned_path, &bytes))
        .await
        .map_err(|e| SourceError::Pdf {
            path: path.to_path_buf(),
            message: format!("Task join error: {e}"),
        })?
}

fn extract_pages(path: &Path, bytes: &[u8]) -> Result<String, SourceError> {
    let doc = Document::load_mem(bytes).map_err(|e| SourceError::Pdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let pages = doc.get_pages();
    debug!(path = %path.display(), pages = pages.len(), "Extracting PDF text");

    let mut text = String::new();
    // BTreeMap keys are page numbers, so iteration is in page order
    for page_num in pages.keys() {
        let page_text = doc.extract_text(&[*page_num]).map_err(|e| SourceError::Pdf {
            path: path.to_path_buf(),
            message: format!("page {page_num}: {e}"),
        })?;
        text.push_str(&page_text);
    }

    Ok(text)
}
