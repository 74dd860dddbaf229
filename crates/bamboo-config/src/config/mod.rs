//! Configuration management for bamboo
//!
//! This module provides hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. Supports TOML configuration files with `[llm]`,
//! `[retry]`, and `[simulation]` sections.

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use discovery::BAMBOO_HOME_ENV;
pub use model::*;
pub use validation::{EMERGENCY_MODES, SUPPORTED_PROVIDERS};

use std::time::Duration;

/// Default model for every generation call
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Environment variable holding the API key unless `[llm] api_key_env` says otherwise
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Retry budget for rate-limited calls
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Wait before the first retry; doubled on each subsequent one
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2000;

/// Per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Posts per feed batch
pub const DEFAULT_FEED_BATCH: u32 = 4;

impl Config {
    /// Model used for all generation operations.
    #[must_use]
    pub fn model(&self) -> String {
        self.llm
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Name of the environment variable holding the API key.
    #[must_use]
    pub fn api_key_env(&self) -> String {
        self.llm
            .api_key_env
            .clone()
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string())
    }

    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or("gemini")
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.retry.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    #[must_use]
    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(
            self.retry
                .initial_delay_ms
                .unwrap_or(DEFAULT_INITIAL_DELAY_MS),
        )
    }

    #[must_use]
    pub fn spicy(&self) -> bool {
        self.simulation.spicy.unwrap_or(false)
    }

    /// Emergency mode name as written in configuration (`none` when unset).
    #[must_use]
    pub fn emergency(&self) -> &str {
        self.simulation.emergency.as_deref().unwrap_or("none")
    }

    #[must_use]
    pub fn feed_batch(&self) -> u32 {
        self.simulation.feed_batch.unwrap_or(DEFAULT_FEED_BATCH)
    }

    /// Configuration with built-in defaults only, no discovery.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            simulation: SimulationConfig::default(),
            config_path: None,
            source_attribution: std::collections::HashMap::new(),
        }
    }
}
