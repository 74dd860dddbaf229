use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{CliArgs, Config, ConfigSource, LlmConfig, RetryConfig, SimulationConfig};

/// Directory searched for upward from the working directory
const CONFIG_DIR: &str = ".bamboo";

/// File name inside [`CONFIG_DIR`] or `$BAMBOO_HOME`
const CONFIG_FILE: &str = "config.toml";

/// Overrides upward discovery when set
pub const BAMBOO_HOME_ENV: &str = "BAMBOO_HOME";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    llm: Option<LlmConfig>,
    retry: Option<RetryConfig>,
    simulation: Option<SimulationConfig>,
}

/// Overwrite `$target` with `$value` when it is set, recording where it came from.
macro_rules! apply {
    ($attr:expr, $source:expr, $key:literal, $target:expr, $value:expr) => {
        if let Some(v) = $value {
            $target = Some(v);
            $attr.insert($key.to_string(), $source.clone());
        }
    };
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover configuration starting from a specific directory.
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut config = Config::defaults();
        let mut attr: HashMap<String, ConfigSource> = HashMap::new();
        for key in [
            "llm_provider",
            "llm_model",
            "llm_api_key_env",
            "llm_timeout_secs",
            "retry_max_retries",
            "retry_initial_delay_ms",
            "simulation_spicy",
            "simulation_emergency",
            "simulation_feed_batch",
        ] {
            attr.insert(key.to_string(), ConfigSource::Defaults);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            let src = ConfigSource::ConfigFile(path.clone());

            if let Some(llm) = file.llm {
                apply!(attr, src, "llm_provider", config.llm.provider, llm.provider);
                apply!(attr, src, "llm_model", config.llm.model, llm.model);
                apply!(attr, src, "llm_api_key_env", config.llm.api_key_env, llm.api_key_env);
                apply!(attr, src, "llm_base_url", config.llm.base_url, llm.base_url);
                apply!(attr, src, "llm_temperature", config.llm.temperature, llm.temperature);
                apply!(
                    attr,
                    src,
                    "llm_max_output_tokens",
                    config.llm.max_output_tokens,
                    llm.max_output_tokens
                );
                apply!(attr, src, "llm_timeout_secs", config.llm.timeout_secs, llm.timeout_secs);
                apply!(attr, src, "llm_budget", config.llm.budget, llm.budget);
            }
            if let Some(retry) = file.retry {
                apply!(
                    attr,
                    src,
                    "retry_max_retries",
                    config.retry.max_retries,
                    retry.max_retries
                );
                apply!(
                    attr,
                    src,
                    "retry_initial_delay_ms",
                    config.retry.initial_delay_ms,
                    retry.initial_delay_ms
                );
            }
            if let Some(sim) = file.simulation {
                apply!(attr, src, "simulation_spicy", config.simulation.spicy, sim.spicy);
                apply!(
                    attr,
                    src,
                    "simulation_emergency",
                    config.simulation.emergency,
                    sim.emergency
                );
                apply!(
                    attr,
                    src,
                    "simulation_feed_batch",
                    config.simulation.feed_batch,
                    sim.feed_batch
                );
            }
        }

        let cli = ConfigSource::Cli;
        apply!(attr, cli, "llm_model", config.llm.model, cli_args.model.clone());
        apply!(attr, cli, "llm_timeout_secs", config.llm.timeout_secs, cli_args.timeout_secs);
        apply!(attr, cli, "retry_max_retries", config.retry.max_retries, cli_args.max_retries);
        apply!(attr, cli, "simulation_spicy", config.simulation.spicy, cli_args.spicy);
        apply!(
            attr,
            cli,
            "simulation_emergency",
            config.simulation.emergency,
            cli_args.emergency.clone()
        );

        config.config_path = config_path;
        config.source_attribution = attr;
        config.validate()?;
        Ok(config)
    }

    /// Locate a config file: `$BAMBOO_HOME/config.toml` first, then
    /// `.bamboo/config.toml` in `start_dir` or any of its ancestors.
    fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        if let Some(home) = std::env::var_os(BAMBOO_HOME_ENV) {
            let candidate = PathBuf::from(home).join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        for dir in start_dir.ancestors() {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?;
        Ok(parsed)
    }
}
