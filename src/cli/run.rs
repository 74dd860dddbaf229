//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{BambooError, CliArgs, Config, ConfigError, ExitCode, UserFriendlyError};
use bamboo_utils::logging::init_tracing;
use bamboo_utils::redaction::redact_error_message;

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns the exit code on failure;
/// main.rs only maps it to the process exit status.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("✗ Failed to initialize logging: {e}");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        spicy: cli.spicy.then_some(true),
        emergency: cli.emergency.clone(),
        max_retries: cli.max_retries,
        timeout_secs: cli.timeout,
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            report_config_failure(&err);
            return Err(ExitCode::CLI_ARGS);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let json = cli.json;
    let result: Result<(), BambooError> = rt.block_on(async {
        match cli.command {
            Commands::Config => commands::execute_config_command(&config, json),
            Commands::Feed { count } => commands::execute_feed_command(&config, count, json).await,
            Commands::Simulate {
                shadow_ban,
                comment,
                reveal_identity,
            } => {
                commands::execute_simulate_command(
                    &config,
                    shadow_ban,
                    comment.as_deref(),
                    reveal_identity,
                    json,
                )
                .await
            }
            Commands::Intercept => commands::execute_intercept_command(&config, json).await,
            Commands::Console => commands::execute_console_command(&config).await,
        }
    });

    if let Err(error) = result {
        eprintln!("{}", redact_error_message(&error.display_for_user()));
        return Err(error.to_exit_code());
    }

    Ok(())
}

/// Print a discovery failure, with suggestions when a `ConfigError` is in the chain.
fn report_config_failure(err: &anyhow::Error) {
    match err.chain().find_map(|e| e.downcast_ref::<ConfigError>()) {
        Some(config_error) => {
            eprintln!("✗ [{}] {}", config_error.category(), config_error.user_message());
            eprintln!("  {err:#}");
            let suggestions = config_error.suggestions();
            if !suggestions.is_empty() {
                eprintln!("  Suggestions:");
                for s in suggestions {
                    eprintln!("    • {s}");
                }
            }
        }
        None => eprintln!("✗ Configuration error: {err:#}"),
    }
}
