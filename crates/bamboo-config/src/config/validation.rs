use bamboo_utils::error::ConfigError;

use super::Config;

/// Emergency mode names accepted in configuration and on the command line
pub const EMERGENCY_MODES: &[&str] = &["none", "teacher-raid", "police-alert"];

/// Providers with a backend implementation
pub const SUPPORTED_PROVIDERS: &[&str] = &["gemini"];

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = self.llm.provider.as_deref()
            && !SUPPORTED_PROVIDERS.contains(&provider)
        {
            return Err(invalid(
                "llm.provider",
                format!("'{provider}' is not supported (expected one of: gemini)"),
            ));
        }

        if let Some(model) = self.llm.model.as_deref()
            && model.trim().is_empty()
        {
            return Err(invalid("llm.model", "must not be empty"));
        }

        if let Some(timeout) = self.llm.timeout_secs {
            if timeout < 5 {
                return Err(invalid("llm.timeout_secs", "must be at least 5 seconds"));
            }
            if timeout > 600 {
                return Err(invalid(
                    "llm.timeout_secs",
                    "exceeds maximum limit of 600 seconds",
                ));
            }
        }

        if let Some(temperature) = self.llm.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }

        if self.llm.max_output_tokens == Some(0) {
            return Err(invalid("llm.max_output_tokens", "must be greater than 0"));
        }

        if self.llm.budget == Some(0) {
            return Err(invalid("llm.budget", "must be greater than 0"));
        }

        if let Some(retries) = self.retry.max_retries
            && retries > 10
        {
            return Err(invalid("retry.max_retries", "exceeds maximum limit of 10"));
        }

        if let Some(delay) = self.retry.initial_delay_ms {
            if delay == 0 {
                return Err(invalid("retry.initial_delay_ms", "must be at least 1 ms"));
            }
            if delay > 60_000 {
                return Err(invalid(
                    "retry.initial_delay_ms",
                    "exceeds maximum limit of 60000 ms",
                ));
            }
        }

        if let Some(emergency) = self.simulation.emergency.as_deref()
            && !EMERGENCY_MODES.contains(&emergency)
        {
            return Err(invalid(
                "simulation.emergency",
                format!("'{emergency}' (expected one of: none, teacher-raid, police-alert)"),
            ));
        }

        if let Some(batch) = self.simulation.feed_batch
            && !(1..=20).contains(&batch)
        {
            return Err(invalid(
                "simulation.feed_batch",
                "must be between 1 and 20",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::defaults().validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let mut config = Config::defaults();
        config.llm.provider = Some("openrouter".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm.provider"));
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = Config::defaults();
        config.llm.timeout_secs = Some(4);
        assert!(config.validate().is_err());
        config.llm.timeout_secs = Some(5);
        assert!(config.validate().is_ok());
        config.llm.timeout_secs = Some(601);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_bounds() {
        let mut config = Config::defaults();
        config.retry.max_retries = Some(0);
        assert!(config.validate().is_ok());
        config.retry.max_retries = Some(11);
        assert!(config.validate().is_err());

        let mut config = Config::defaults();
        config.retry.initial_delay_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_emergency_names() {
        for name in EMERGENCY_MODES {
            let mut config = Config::defaults();
            config.simulation.emergency = Some((*name).to_string());
            assert!(config.validate().is_ok(), "{name} should be accepted");
        }
        let mut config = Config::defaults();
        config.simulation.emergency = Some("TEACHER_RAID".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_feed_batch_bounds() {
        let mut config = Config::defaults();
        config.simulation.feed_batch = Some(0);
        assert!(config.validate().is_err());
        config.simulation.feed_batch = Some(20);
        assert!(config.validate().is_ok());
        config.simulation.feed_batch = Some(21);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_bounds() {
        let mut config = Config::defaults();
        config.llm.temperature = Some(2.5);
        assert!(config.validate().is_err());
        config.llm.temperature = Some(0.9);
        assert!(config.validate().is_ok());
    }
}
