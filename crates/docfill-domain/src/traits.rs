//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the fill pipeline and the
//! outside world. Implementations live in other crates.

use crate::{DocumentHandle, PromptSections};
use async_trait::async_trait;

/// Capability that turns a document handle into text
///
/// Implemented by the infrastructure layer (docfill-source). The pipeline only
/// depends on this trait, never on a concrete document kind.
#[async_trait]
pub trait DocumentLoader {
    /// Error type for load operations
    type Error;

    /// Read and extract the full text of a document
    ///
    /// Every call re-reads the source; implementations do not cache.
    async fn load(&self, document: &DocumentHandle) -> Result<String, Self::Error>;
}

/// Capability that sends a prompt to a completion engine
///
/// Implemented by the infrastructure layer (docfill-llm). One call is one
/// request: implementations do not retry and do not interpret the returned
/// text.
#[async_trait]
pub trait CompletionEngine {
    /// Error type for completion operations
    type Error;

    /// Name of the model answering requests
    fn model_name(&self) -> &str;

    /// Send the sections and return the raw completion text
    async fn complete(&self, sections: &PromptSections) -> Result<String, Self::Error>;
}
