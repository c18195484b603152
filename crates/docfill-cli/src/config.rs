//! Run configuration for the CLI.

use crate::cli::{Cli, ProviderArg};
use crate::error::{CliError, Result};
use docfill_extractor::FillConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Run configuration: file values, then flag overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Orchestrator settings
    pub fill: FillConfig,

    /// Completion engine settings
    pub engine: EngineSettings,
}

/// Completion engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Which provider to call
    pub provider: Provider,

    /// Model name; the provider's default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Base URL override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Time limit for one HTTP request, in seconds
    pub request_timeout_secs: u64,
}

/// Completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl Provider {
    /// Whether the provider needs an API key
    pub fn needs_credential(&self) -> bool {
        matches!(self, Provider::OpenAi)
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => docfill_llm::openai::DEFAULT_MODEL,
            Provider::Ollama => docfill_llm::ollama::DEFAULT_MODEL,
        }
    }
}

impl From<ProviderArg> for Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Openai => Provider::OpenAi,
            ProviderArg::Ollama => Provider::Ollama,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: None,
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl EngineSettings {
    /// The configured model, or the provider's default
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

impl RunConfig {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".docfill").join("config.toml"))
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: RunConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load the given file, or the default file if it exists, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Ok(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(provider) = cli.provider {
            self.engine.provider = provider.into();
        }
        if let Some(model) = &cli.model {
            self.engine.model = Some(model.clone());
        }
        if let Some(endpoint) = &cli.endpoint {
            self.engine.endpoint = Some(endpoint.clone());
        }
        if let Some(pacing) = cli.pacing_ms {
            self.fill.pacing_interval_ms = pacing;
        }
        if let Some(timeout) = cli.timeout_secs {
            self.fill.task_timeout_secs = timeout;
        }
        if let Some(slots) = cli.max_in_flight {
            self.fill.max_in_flight = Some(slots);
        }
        if let Some(ordering) = cli.ordering {
            self.fill.ordering = ordering.into();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.fill.validate().map_err(CliError::Config)?;
        if self.engine.model().trim().is_empty() {
            return Err(CliError::Config("engine model must not be empty".into()));
        }
        if self.engine.request_timeout_secs == 0 {
            return Err(CliError::Config(
                "engine request_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Check the credential once, before any document is dispatched.
    ///
    /// `value` is the content of the environment variable named by
    /// `api_key_env`. Providers without a credential return `None`.
    pub fn require_credential(&self, value: Option<String>) -> Result<Option<String>> {
        if !self.engine.provider.needs_credential() {
            return Ok(None);
        }

        match value {
            Some(key) if !key.trim().is_empty() => Ok(Some(key)),
            _ => Err(CliError::Config(format!(
                "API key not found: set the {} environment variable",
                self.engine.api_key_env
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use docfill_extractor::OrderingPolicy;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.engine.provider, Provider::OpenAi);
        assert_eq!(config.engine.model, None);
        assert_eq!(config.engine.model(), "gpt-4");
        assert_eq!(config.engine.api_key_env, "OPENAI_API_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[fill]\npacing_interval_ms = 250\nordering = \"arrival_order\"\n\n\
             [engine]\nprovider = \"ollama\"\nmodel = \"llama3\""
        )
        .unwrap();

        let config = RunConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.fill.pacing_interval_ms, 250);
        assert_eq!(config.fill.ordering, OrderingPolicy::ArrivalOrder);
        assert_eq!(config.fill.task_timeout_secs, 120);
        assert_eq!(config.engine.provider, Provider::Ollama);
        assert_eq!(config.engine.model(), "llama3");
        assert_eq!(config.engine.request_timeout_secs, 120);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RunConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fill\npacing_interval_ms = ").unwrap();
        assert!(matches!(
            RunConfig::load(Some(file.path())),
            Err(CliError::Toml(_))
        ));
    }

    #[test]
    fn test_flag_overrides() {
        let cli = Cli::try_parse_from([
            "docfill",
            "--file",
            "a.txt",
            "--json",
            "s.json",
            "--provider",
            "ollama",
            "--model",
            "mistral",
            "--pacing-ms",
            "0",
            "--timeout-secs",
            "30",
            "--max-in-flight",
            "3",
            "--ordering",
            "arrival",
        ])
        .unwrap();

        let mut config = RunConfig::default();
        config.apply_overrides(&cli);

        assert_eq!(config.engine.provider, Provider::Ollama);
        assert_eq!(config.engine.model(), "mistral");
        assert_eq!(config.fill.pacing_interval_ms, 0);
        assert_eq!(config.fill.task_timeout_secs, 30);
        assert_eq!(config.fill.max_in_flight, Some(3));
        assert_eq!(config.fill.ordering, OrderingPolicy::ArrivalOrder);
    }

    #[test]
    fn test_provider_selects_its_default_model() {
        let cli = Cli::try_parse_from([
            "docfill", "--file", "a.txt", "--json", "s.json", "--provider", "ollama",
        ])
        .unwrap();

        let mut config = RunConfig::default();
        config.apply_overrides(&cli);

        assert_eq!(config.engine.provider, Provider::Ollama);
        assert_eq!(config.engine.model(), docfill_llm::ollama::DEFAULT_MODEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_configured_model_wins_over_provider_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nmodel = \"mistral\"").unwrap();
        let cli = Cli::try_parse_from([
            "docfill", "--file", "a.txt", "--json", "s.json", "--provider", "ollama",
        ])
        .unwrap();

        let mut config = RunConfig::load(Some(file.path())).unwrap();
        config.apply_overrides(&cli);
        assert_eq!(config.engine.model(), "mistral");
    }

    #[test]
    fn test_blank_model_is_rejected() {
        let mut config = RunConfig::default();
        config.engine.model = Some("  ".into());
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_fill_settings() {
        let mut config = RunConfig::default();
        config.fill.max_in_flight = Some(0);
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_credential_check() {
        let config = RunConfig::default();
        assert!(matches!(
            config.require_credential(None),
            Err(CliError::Config(msg)) if msg.contains("OPENAI_API_KEY")
        ));
        assert!(config.require_credential(Some("  ".into())).is_err());
        assert_eq!(
            config.require_credential(Some("sk-test".into())).unwrap(),
            Some("sk-test".to_string())
        );

        let mut local = RunConfig::default();
        local.engine.provider = Provider::Ollama;
        assert_eq!(local.require_credential(None).unwrap(), None);
    }
}
