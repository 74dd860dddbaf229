use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    ConfigFile(PathBuf),
    Programmatic,
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "default"),
        }
    }
}

/// Configuration for bamboo.
///
/// # Configuration File Format
///
/// ```toml
/// [llm]
/// provider = "gemini"
/// model = "gemini-3-flash-preview"
/// api_key_env = "GEMINI_API_KEY"
/// timeout_secs = 120
/// budget = 200
///
/// [retry]
/// max_retries = 3
/// initial_delay_ms = 2000
///
/// [simulation]
/// spicy = false
/// emergency = "none"
/// feed_batch = 4
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub simulation: SimulationConfig,
    /// File the values were loaded from, if any
    pub config_path: Option<PathBuf>,
    /// Source attribution for each setting (for `bamboo config`)
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Generation service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    /// Maximum generation calls per process; unlimited when unset
    pub budget: Option<u32>,
}

/// Backoff for rate-limited calls
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
}

/// Starting tone for a session. Both values can be changed while running.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub spicy: Option<bool>,
    /// `none`, `teacher-raid` or `police-alert`
    pub emergency: Option<String>,
    pub feed_batch: Option<u32>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub spicy: Option<bool>,
    pub emergency: Option<String>,
    pub max_retries: Option<u32>,
    pub timeout_secs: Option<u64>,
}
