use std::collections::HashMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    match source {
        Some(ConfigSource::Cli) => "cli".to_string(),
        Some(ConfigSource::ConfigFile(_)) => "config".to_string(),
        Some(ConfigSource::Programmatic) => "programmatic".to_string(),
        Some(ConfigSource::Defaults) | None => "default".to_string(),
    }
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    #[must_use]
    pub fn effective_config(&self) -> HashMap<String, (String, String)> {
        let mut config = HashMap::new();

        let mut add = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add("llm_provider", self.provider().to_string());
        add("llm_model", self.model());
        add("llm_api_key_env", self.api_key_env());
        add("llm_timeout_secs", self.request_timeout().as_secs().to_string());
        if let Some(url) = &self.llm.base_url {
            add("llm_base_url", url.clone());
        }
        if let Some(temperature) = self.llm.temperature {
            add("llm_temperature", temperature.to_string());
        }
        if let Some(tokens) = self.llm.max_output_tokens {
            add("llm_max_output_tokens", tokens.to_string());
        }
        if let Some(budget) = self.llm.budget {
            add("llm_budget", budget.to_string());
        }

        add("retry_max_retries", self.max_retries().to_string());
        add(
            "retry_initial_delay_ms",
            self.initial_retry_delay().as_millis().to_string(),
        );

        add("simulation_spicy", self.spicy().to_string());
        add("simulation_emergency", self.emergency().to_string());
        add("simulation_feed_batch", self.feed_batch().to_string());

        config
    }
}
