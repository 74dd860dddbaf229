//! Configuration for bamboo
//!
//! Hierarchical configuration with precedence CLI > file > defaults. See
//! [`Config`] for the file format.

pub mod config;

pub use config::{
    CliArgs, Config, ConfigBuilder, ConfigSource, LlmConfig, RetryConfig, SimulationConfig,
};
