//! OpenAI Engine Implementation
//!
//! Sends prompt sections to an OpenAI-compatible `/chat/completions`
//! endpoint as an ordered message list and returns the first choice's text.
//!
//! # Examples
//!
//! ```no_run
//! use docfill_llm::OpenAiEngine;
//!
//! let engine = OpenAiEngine::new("sk-...", "gpt-4").unwrap();
//! ```

use crate::LlmError;
use async_trait::async_trait;
use docfill_domain::{CompletionEngine, PromptSections};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default timeout for a single completion request (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI chat completions engine
///
/// The API key is passed in explicitly; this type never reads the
/// environment.
pub struct OpenAiEngine {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

/// Request body for the chat completions API
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the chat completions API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiEngine {
    /// Create a new OpenAI engine
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Other`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new OpenAI engine with a custom request timeout
    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Set a custom base URL (for Azure, proxies, compatible servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body<'a>(&'a self, sections: &'a PromptSections) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: sections
                .iter()
                .map(|s| ChatMessage {
                    role: s.role.as_str(),
                    content: &s.content,
                })
                .collect(),
        }
    }
}

/// Map a non-success HTTP status to an engine error
fn status_error(status: StatusCode, body: String, model: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Authentication(body),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

/// Take the first choice's content
fn first_choice(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(LlmError::NoChoices)
}

#[async_trait]
impl CompletionEngine for OpenAiEngine {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, sections: &PromptSections) -> Result<String, LlmError> {
        let start = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(sections))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Completion request failed");
                LlmError::Communication(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Completion API error");
            return Err(status_error(status, error_text, &self.model));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = first_choice(body)?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "Chat completion"
        );

        Ok(content)
    }
}
