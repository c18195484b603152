//! Configuration for the fill orchestrator

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Order of the entries in the aggregate output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Entries follow the input document enumeration
    InputOrder,
    /// Entries follow task completion order
    ArrivalOrder,
}

impl Default for OrderingPolicy {
    fn default() -> Self {
        OrderingPolicy::InputOrder
    }
}

/// Configuration for the fill orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Minimum delay between starting successive documents (milliseconds)
    pub pacing_interval_ms: u64,

    /// Maximum time for one document's whole pipeline (seconds)
    pub task_timeout_secs: u64,

    /// Maximum number of documents in flight at once (unbounded when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<usize>,

    /// Order of the aggregate output
    pub ordering: OrderingPolicy,

    /// Output key carrying each record's document identity
    pub identity_key: String,
}

impl FillConfig {
    /// Get the pacing interval as a Duration
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }

    /// Get the per-document timeout as a Duration
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.task_timeout_secs == 0 {
            return Err("task_timeout_secs must be greater than 0".to_string());
        }
        if self.max_in_flight == Some(0) {
            return Err("max_in_flight must be greater than 0 when set".to_string());
        }
        if self.identity_key.trim().is_empty() {
            return Err("identity_key must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for FillConfig {
    /// One-second stagger, unbounded concurrency, input-order output
    fn default() -> Self {
        Self {
            pacing_interval_ms: 1_000,
            task_timeout_secs: 120,
            max_in_flight: None,
            ordering: OrderingPolicy::InputOrder,
            identity_key: "filename".to_string(),
        }
    }
}

impl FillConfig {
    /// Aggressive preset: short stagger and timeout, bounded pool
    pub fn aggressive() -> Self {
        Self {
            pacing_interval_ms: 250,
            task_timeout_secs: 60,
            max_in_flight: Some(8),
            ..Self::default()
        }
    }

    /// Lenient preset: slow stagger and long timeout for rate-limited engines
    pub fn lenient() -> Self {
        Self {
            pacing_interval_ms: 2_000,
            task_timeout_secs: 300,
            max_in_flight: Some(2),
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
