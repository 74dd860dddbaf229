//! Logging and observability for bamboo
//!
//! Structured logging through `tracing`. The binary installs a subscriber with
//! [`init_tracing`]; the library crates only emit events and spans.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Colored output only on a TTY and when NO_COLOR is unset.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode logs bamboo crates at
/// debug level with targets and span close timings; the default is a compact
/// warn-level format so console output stays readable.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("bamboo=debug,bamboo_llm=debug,bamboo_engine=debug,info")
            } else {
                EnvFilter::try_new("bamboo=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span wrapping one generation operation
pub fn generation_span(operation: &str, article_id: Option<&str>) -> tracing::Span {
    span!(
        Level::INFO,
        "generation",
        operation = %operation,
        article_id = article_id.unwrap_or("-"),
    )
}

pub fn log_generation_start(operation: &str, model: &str) {
    info!(operation = %operation, model = %model, "Starting generation");
}

pub fn log_generation_complete(operation: &str, duration_ms: u128, items: usize) {
    info!(
        operation = %operation,
        duration_ms = %duration_ms,
        items = items,
        "Generation completed"
    );
}

/// Log a failed generation. The message is scrubbed of credentials first.
pub fn log_generation_error(operation: &str, error: &str, duration_ms: u128) {
    let sanitized = redact_error_message(error);
    error!(
        operation = %operation,
        duration_ms = %duration_ms,
        error = %sanitized,
        "Generation failed"
    );
}
