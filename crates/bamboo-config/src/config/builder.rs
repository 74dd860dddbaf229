use std::collections::HashMap;
use std::time::Duration;

use bamboo_utils::error::ConfigError;

use super::{Config, ConfigSource, LlmConfig, RetryConfig, SimulationConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the simulator without a config file.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use bamboo_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .model("gemini-3-flash-preview")
    ///     .max_retries(5)
    ///     .initial_retry_delay(Duration::from_millis(500))
    ///     .emergency("teacher-raid")
    ///     .build()
    ///     .expect("Failed to build config");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent builder for [`Config`].
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    llm: LlmConfig,
    retry: RetryConfig,
    simulation: SimulationConfig,
    attribution: HashMap<String, ConfigSource>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn mark(&mut self, key: &str) {
        self.attribution
            .insert(key.to_string(), ConfigSource::Programmatic);
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.llm.model = Some(model.into());
        self.mark("llm_model");
        self
    }

    #[must_use]
    pub fn api_key_env(mut self, name: impl Into<String>) -> Self {
        self.llm.api_key_env = Some(name.into());
        self.mark("llm_api_key_env");
        self
    }

    /// Point the backend at a different endpoint (used by tests and proxies).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.llm.base_url = Some(url.into());
        self.mark("llm_base_url");
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.llm.timeout_secs = Some(timeout.as_secs());
        self.mark("llm_timeout_secs");
        self
    }

    #[must_use]
    pub fn budget(mut self, calls: u32) -> Self {
        self.llm.budget = Some(calls);
        self.mark("llm_budget");
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.retry.max_retries = Some(retries);
        self.mark("retry_max_retries");
        self
    }

    #[must_use]
    pub fn initial_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.initial_delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self.mark("retry_initial_delay_ms");
        self
    }

    #[must_use]
    pub fn spicy(mut self, spicy: bool) -> Self {
        self.simulation.spicy = Some(spicy);
        self.mark("simulation_spicy");
        self
    }

    /// Emergency mode by configuration name (`none`, `teacher-raid`, `police-alert`).
    #[must_use]
    pub fn emergency(mut self, mode: impl Into<String>) -> Self {
        self.simulation.emergency = Some(mode.into());
        self.mark("simulation_emergency");
        self
    }

    #[must_use]
    pub fn feed_batch(mut self, size: u32) -> Self {
        self.simulation.feed_batch = Some(size);
        self.mark("simulation_feed_batch");
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let config = Config {
            llm: self.llm,
            retry: self.retry,
            simulation: self.simulation,
            config_path: None,
            source_attribution: self.attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
