//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
///
/// Any of these stops the run before output is produced. Failures of single
/// documents are reported in the output instead.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error: bad shape, missing documents or credential, invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document discovery error
    #[error("Source error: {0}")]
    Source(#[from] docfill_source::SourceError),

    /// Extractor setup error
    #[error("Extractor error: {0}")]
    Extractor(#[from] docfill_extractor::ExtractorError),

    /// Completion engine setup error
    #[error("Engine error: {0}")]
    Engine(#[from] docfill_llm::LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
