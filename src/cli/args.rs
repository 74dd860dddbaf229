//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bamboo - simulated anonymous school board console
#[derive(Parser, Debug)]
#[command(name = "bamboo")]
#[command(about = "Operate a simulated anonymous high-school board generated by an LLM")]
#[command(long_about = r#"
bamboo simulates a Korean high-school "bamboo forest" board. Every post, comment,
reply and private message is generated on demand by a structured-output LLM call.
You play the operator: read posts, unmask authors, shadow-ban posts and watch the
simulated students react.

EXAMPLES:
  # Generate a batch of posts
  bamboo feed --count 6

  # Generate a post and its comment thread, shadow banned
  bamboo simulate --shadow-ban

  # Intercept the author's private messages
  bamboo intercept --json

  # Show the effective configuration and where each value came from
  bamboo config

  # Interactive operator console
  bamboo console --spicy --emergency teacher-raid

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  The config file is $BAMBOO_HOME/config.toml or the nearest .bamboo/config.toml
  found searching upward from the current directory. Use --config to override.
  The API key is read from the environment variable named by llm.api_key_env
  (GEMINI_API_KEY by default).
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model to use for generation calls
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Aggressive tone for generated content
    #[arg(long, global = true)]
    pub spicy: bool,

    /// Scenario bias: none, teacher-raid or police-alert
    #[arg(long, global = true)]
    pub emergency: Option<String>,

    /// Retries after a rate-limited call (default: 3)
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Per-request timeout in seconds (default: 120, range 5-600)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a batch of posts
    Feed {
        /// Number of posts (1-20, default: simulation.feed_batch)
        #[arg(long)]
        count: Option<u32>,
    },

    /// Generate one post and simulate its comment thread
    Simulate {
        /// Shadow-ban the post before analysis
        #[arg(long)]
        shadow_ban: bool,

        /// Post an operator comment and simulate the reactions
        #[arg(long)]
        comment: Option<String>,

        /// Post the operator comment as 👑운영자
        #[arg(long)]
        reveal_identity: bool,
    },

    /// Generate one post and intercept its author's private messages
    Intercept,

    /// Show the effective configuration with source attribution
    Config,

    /// Interactive operator console reading commands from stdin
    Console,
}

/// Build the CLI command structure (used for testing and completions)
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
