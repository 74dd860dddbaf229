//! Generation service boundary for bamboo
//!
//! Every provider implements [`LlmBackend`]. Callers describe the expected
//! response shape with a [`Schema`] and wrap calls in a [`RetryPolicy`], which
//! is the only place rate-limited calls are retried.

mod budgeted_backend;
mod gemini_backend;
pub(crate) mod http_client;
pub mod retry;
pub mod schema;
#[cfg(any(test, feature = "test-utils"))]
mod scripted_backend;
mod types;

pub use bamboo_utils::error::LlmError;
pub use budgeted_backend::BudgetedBackend;
pub use gemini_backend::DEFAULT_BASE_URL;
pub use retry::RetryPolicy;
pub use schema::{Schema, SchemaType};
#[cfg(any(test, feature = "test-utils"))]
pub use scripted_backend::ScriptedBackend;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

use bamboo_config::Config;
use gemini_backend::GeminiBackend;

/// Create a backend from configuration.
///
/// The backend is wrapped in a [`BudgetedBackend`] when `[llm] budget` is set.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` if the provider is unknown.
/// Returns `LlmError::Misconfiguration` if provider-specific configuration is
/// invalid (for example the API key variable is unset).
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    let backend: Box<dyn LlmBackend> = match config.provider() {
        "gemini" => Box::new(GeminiBackend::new_from_config(config)?),
        unknown => {
            return Err(LlmError::Unsupported(format!(
                "Unknown LLM provider '{unknown}'. Supported providers: gemini."
            )));
        }
    };

    Ok(match config.llm.budget {
        Some(limit) => Box::new(BudgetedBackend::new(backend, limit)),
        None => backend,
    })
}
