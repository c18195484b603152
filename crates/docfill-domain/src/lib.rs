//! Docfill Domain Layer
//!
//! This crate contains the shared vocabulary of the fill pipeline: the
//! documents being processed, the prompt handed to a completion engine, and
//! the two capability traits the pipeline is built on.
//!
//! ## Key Concepts
//!
//! - **Document handle**: an identified, located, kind-tagged reference to one
//!   input document, not yet loaded
//! - **Prompt sections**: the ordered, labeled messages sent to the completion
//!   engine for one document
//! - **DocumentLoader**: turns a handle into text
//! - **CompletionEngine**: turns prompt sections into raw completion text
//!
//! ## Architecture
//!
//! The domain crate only defines types and traits. Filesystem access lives in
//! `docfill-source`, engine implementations in `docfill-llm`, and the
//! concurrent pipeline in `docfill-extractor`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod prompt;
pub mod traits;

// Re-exports for convenience
pub use document::{DocumentHandle, DocumentKind};
pub use prompt::{PromptSection, PromptSections, Role, SectionKind};
pub use traits::{CompletionEngine, DocumentLoader};
