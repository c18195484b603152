//! Docfill Extractor
//!
//! Fills a target JSON shape from every document of a set, using a
//! completion engine.
//!
//! # Overview
//!
//! The caller describes the record it wants as a [`TargetShape`]. The shape is
//! derived once into a [`SchemaDocument`] that is shared by every document's
//! prompt. The [`FillOrchestrator`] then runs one task per document: load the
//! text, build the prompt, ask the engine, parse and check the answer.
//!
//! # Architecture
//!
//! ```text
//! TargetShape → SchemaDeriver → SchemaDocument ─┐
//!                                               ▼
//! DocumentHandle → DocumentLoader → text → PromptBuilder → CompletionEngine
//!                                                               │
//!                      AggregateOutput ← FillResult ← parse + shape check
//! ```
//!
//! # Key Features
//!
//! - **Shape input**: builder API, skeleton JSON, or any `schemars::JsonSchema` type
//! - **Failure isolation**: one result per document, failures never stop the run
//! - **Paced dispatch**: a minimum delay between starting successive documents
//! - **Optional bounded pool** and per-document timeout
//! - **Deterministic output** in input order, or arrival order on request
//!
//! # Example Usage
//!
//! ```no_run
//! use docfill_extractor::{FieldType, FillConfig, FillOrchestrator, SchemaDeriver, TargetShape};
//! use docfill_llm::MockEngine;
//! use docfill_source::{DocumentSet, FileSystemSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let shape = TargetShape::new()
//!     .field("name", FieldType::String)
//!     .field("age", FieldType::Integer);
//! let schema = SchemaDeriver::derive(&shape)?;
//!
//! let source = FileSystemSource::new();
//! let documents = source.discover(&DocumentSet::Directory("./people".into()))?;
//!
//! let engine = MockEngine::new(r#"{"name":"John Smith","age":30}"#);
//! let orchestrator = FillOrchestrator::new(source, engine, schema, FillConfig::default())?;
//!
//! let output = orchestrator.run(documents).await;
//! println!("{}", output.to_json_string()?);
//! println!("Failures: {}", output.failures().count());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod orchestrator;
mod parser;
mod prompt;
mod schema;
mod types;


pub use config::{FillConfig, OrderingPolicy};
pub use error::{ExtractorError, SchemaError, ShapeError};
pub use orchestrator::FillOrchestrator;
pub use parser::parse_completion;
pub use prompt::{PromptBuilder, DATA_LABEL, OUTPUT_LABEL, SCHEMA_LABEL, SYSTEM_PROMPT};
pub use schema::{FieldType, SchemaDeriver, SchemaDocument, ShapeField, TargetShape};
pub use types::{
    AggregateOutput, BatchMetadata, DocumentState, FailureKind, FillFailure, FillOutcome,
    FillRecord, FillResult,
};
