//! Docfill Completion Engines
//!
//! Implementations of the `CompletionEngine` trait from `docfill-domain`.
//!
//! # Engines
//!
//! - `MockEngine`: Deterministic stub for testing
//! - `OpenAiEngine`: OpenAI-compatible chat completions API
//! - `OllamaEngine`: Local Ollama API integration
//!
//! Every engine performs exactly one request per `complete` call. There is
//! no retry or backoff, and the returned text is passed back untouched.
//!
//! # Examples
//!
//! ```
//! use docfill_llm::MockEngine;
//! use docfill_domain::{CompletionEngine, PromptSection, PromptSections, SectionKind};
//!
//! # async fn example() -> Result<(), docfill_llm::LlmError> {
//! let engine = MockEngine::new(r#"{"name":"John"}"#);
//! let sections = PromptSections::new(vec![
//!     PromptSection::system(SectionKind::Data, "Name: John"),
//! ]);
//! let raw = engine.complete(&sections).await?;
//! assert_eq!(raw, r#"{"name":"John"}"#);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use docfill_domain::{CompletionEngine, PromptSections, SectionKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaEngine;
pub use openai::OpenAiEngine;

/// Errors that can occur during completion requests
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The credential was rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The engine answered without any choice to read
    #[error("Engine returned no choices")]
    NoChoices,

    /// Invalid response from the engine
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
}

#[derive(Debug, Default)]
struct MockState {
    replies: HashMap<String, MockReply>,
    delays: HashMap<String, Duration>,
    calls: Vec<String>,
}

/// Mock completion engine for deterministic testing
///
/// Replies are keyed by the document text found in the prompt's
/// [`SectionKind::Data`] section. Documents without a configured reply get
/// the default response. No network calls are made.
///
/// # Examples
///
/// ```
/// use docfill_llm::MockEngine;
///
/// let mut engine = MockEngine::default();
/// engine.add_response("Name: Ada", r#"{"name":"Ada"}"#);
/// engine.add_error("broken document", "connection reset");
/// assert_eq!(engine.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockEngine {
    default_response: String,
    model_name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    /// Create a new MockEngine with a fixed response for all documents
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            model_name: "mock".to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the model name reported by the engine
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Add a specific response for a given document text
    pub fn add_response(&mut self, data: impl Into<String>, response: impl Into<String>) {
        self.lock()
            .replies
            .insert(data.into(), MockReply::Text(response.into()));
    }

    /// Configure to fail for a specific document text
    pub fn add_error(&mut self, data: impl Into<String>, message: impl Into<String>) {
        self.lock()
            .replies
            .insert(data.into(), MockReply::Error(message.into()));
    }

    /// Delay the reply for a specific document text
    pub fn add_delay(&mut self, data: impl Into<String>, delay: Duration) {
        self.lock().delays.insert(data.into(), delay);
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Document texts in the order their requests started
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Reset the recorded calls
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl CompletionEngine for MockEngine {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, sections: &PromptSections) -> Result<String, LlmError> {
        let data = sections
            .get(SectionKind::Data)
            .map(|s| s.content.clone())
            .unwrap_or_default();

        // The guard must be released before awaiting
        let (reply, delay) = {
            let mut state = self.lock();
            state.calls.push(data.clone());
            (state.replies.get(&data).cloned(), state.delays.get(&data).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(message)) => Err(LlmError::Other(message)),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill_domain::PromptSection;

    fn prompt_for(data: &str) -> PromptSections {
        PromptSections::new(vec![
            PromptSection::system(SectionKind::SystemInstruction, "parse"),
            PromptSection::system(SectionKind::Data, data),
        ])
    }

    #[tokio::test]
    async fn test_mock_engine_default() {
        let engine = MockEngine::new("Test response");
        let result = engine.complete(&prompt_for("anything")).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_engine_specific_responses() {
        let mut engine = MockEngine::default();
        engine.add_response("hello", "world");
        engine.add_response("foo", "bar");

        assert_eq!(engine.complete(&prompt_for("hello")).await.unwrap(), "world");
        assert_eq!(engine.complete(&prompt_for("foo")).await.unwrap(), "bar");
        assert_eq!(engine.complete(&prompt_for("unknown")).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_mock_engine_records_calls() {
        let engine = MockEngine::new("test");
        assert_eq!(engine.call_count(), 0);

        engine.complete(&prompt_for("one")).await.unwrap();
        engine.complete(&prompt_for("two")).await.unwrap();
        assert_eq!(engine.calls(), vec!["one", "two"]);

        engine.reset_calls();
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_engine_error() {
        let mut engine = MockEngine::default();
        engine.add_error("bad document", "boom");

        let result = engine.complete(&prompt_for("bad document")).await;
        assert_eq!(result.unwrap_err(), LlmError::Other("boom".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_engine_delay() {
        let mut engine = MockEngine::new("late");
        engine.add_delay("slow", Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        engine.complete(&prompt_for("slow")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_mock_engine_clone_shares_state() {
        let engine1 = MockEngine::new("test");
        let engine2 = engine1.clone();

        engine1.complete(&prompt_for("x")).await.unwrap();

        // Both share the same call log due to Arc
        assert_eq!(engine1.call_count(), 1);
        assert_eq!(engine2.call_count(), 1);
    }

    #[test]
    fn test_model_name() {
        let engine = MockEngine::default().with_model_name("stub-1");
        assert_eq!(engine.model_name(), "stub-1");
    }
}
