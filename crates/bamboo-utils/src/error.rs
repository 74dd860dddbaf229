use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type with user-friendly reporting.
///
/// `BambooError` is what the CLI and embedding applications see. It wraps the
/// narrower error types produced by each layer:
///
/// | Variant | Raised by |
/// |---------|-----------|
/// | `Config` | configuration discovery and validation |
/// | `Llm` | backend construction (missing key, bad provider) |
/// | `Generation` | any of the content generation operations |
/// | `Io` | console input/output |
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to process exit
/// codes and [`display_for_user()`](Self::display_for_user) for a formatted
/// report with suggestions.
#[derive(Error, Debug)]
pub enum BambooError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Generation,
    ResourceLimits,
    Network,
    Validation,
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Generation => write!(f, "Generation"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
            Self::Network => write!(f, "Network"),
            Self::Validation => write!(f, "Validation"),
            Self::Io => write!(f, "I/O"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("The configuration file could not be parsed: {msg}"),
            Self::MissingRequired(what) => format!("Required setting '{what}' is missing"),
            Self::InvalidValue { key, value } => format!("Setting '{key}' is invalid: {value}"),
            Self::NotFound { path } => format!("No configuration file at {path}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some(
            "Configuration is read from .bamboo/config.toml (searched upward from the \
             current directory) or $BAMBOO_HOME/config.toml, then overridden by CLI flags."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the configuration file".to_string(),
                "Run 'bamboo config' to see which file is being loaded".to_string(),
            ],
            Self::MissingRequired(_) => {
                vec!["Add the missing key to .bamboo/config.toml or pass it as a flag".to_string()]
            }
            Self::InvalidValue { .. } => vec![
                "Correct the value in the configuration file or on the command line".to_string(),
            ],
            Self::NotFound { .. } => vec![
                "Create the file or drop the --config flag to use discovery".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors raised by an LLM backend for a single invocation
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, unreadable body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Call budget for this process is spent
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Markers that identify quota exhaustion in provider error text.
const RATE_LIMIT_MARKERS: &[&str] = &["429", "RESOURCE_EXHAUSTED"];

impl LlmError {
    /// Whether this failure carries the rate-limit signature.
    ///
    /// Quota errors always qualify. Other variants qualify when their message
    /// contains an HTTP 429 code or the `RESOURCE_EXHAUSTED` status some
    /// providers return in an otherwise generic error body.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::ProviderQuota(_) => true,
            Self::Transport(msg) | Self::ProviderOutage(msg) | Self::Unsupported(msg) => {
                RATE_LIMIT_MARKERS.iter().any(|m| msg.contains(m))
            }
            Self::ProviderAuth(_)
            | Self::Timeout { .. }
            | Self::BudgetExceeded { .. }
            | Self::Misconfiguration(_) => false,
        }
    }
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("Could not reach the generation service: {msg}"),
            Self::ProviderAuth(msg) => format!("The generation service rejected the API key: {msg}"),
            Self::ProviderQuota(msg) => format!("The generation service quota is exhausted: {msg}"),
            Self::ProviderOutage(msg) => format!("The generation service is unavailable: {msg}"),
            Self::Timeout { duration } => {
                format!("The generation service did not answer within {duration:?}")
            }
            Self::BudgetExceeded { limit, attempted } => format!(
                "Generation call budget spent: attempted {attempted} calls, limit is {limit}"
            ),
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ProviderAuth(_) | Self::Misconfiguration(_) => Some(
                "Authentication errors indicate a missing or invalid API key.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::BudgetExceeded { .. } => Some(
                "The per-process call budget caps how many generations one session may run."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ProviderAuth(_) | Self::Misconfiguration(_) => vec![
                "Check that the API key environment variable (default GEMINI_API_KEY) is set"
                    .to_string(),
                "Verify the key is valid for the configured model".to_string(),
            ],
            Self::ProviderQuota(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Check the quota and billing status of your API key".to_string(),
            ],
            Self::BudgetExceeded { .. } => {
                vec!["Raise [llm] budget in .bamboo/config.toml or restart the session".to_string()]
            }
            Self::Timeout { .. } => vec![
                "Increase [llm] timeout_secs".to_string(),
                "Check your internet connection".to_string(),
            ],
            Self::Transport(_) | Self::ProviderOutage(_) | Self::Unsupported(_) => {
                vec!["Try again in a moment".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderAuth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
            Self::ProviderQuota(_) | Self::BudgetExceeded { .. } => ErrorCategory::ResourceLimits,
            Self::Transport(_) | Self::ProviderOutage(_) | Self::Timeout { .. } => {
                ErrorCategory::Network
            }
        }
    }
}

/// Failure of one content generation operation.
///
/// Rate limiting is kept apart from every other failure so the operator can be
/// told to look at quota and credentials instead of simply retrying.
#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    /// Retry budget spent while the service kept signalling quota exhaustion
    #[error("{operation}: rate limited after {attempts} attempt(s): {message}")]
    RateLimited {
        operation: String,
        attempts: u32,
        message: String,
    },

    /// Any other backend failure; never retried
    #[error("{operation}: {source}")]
    Backend {
        operation: String,
        #[source]
        source: LlmError,
    },

    /// The service answered without any content
    #[error("{operation}: generation service returned no content")]
    EmptyResponse { operation: String },

    /// The content did not match the declared response shape
    #[error("{operation}: malformed response: {reason}")]
    MalformedResponse { operation: String, reason: String },

    /// The request could not be built from the given inputs
    #[error("invalid generation request: {reason}")]
    InvalidRequest { reason: String },
}

impl GenerationError {
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl UserFriendlyError for GenerationError {
    fn user_message(&self) -> String {
        match self {
            Self::RateLimited { attempts, .. } => format!(
                "The generation service is rate limiting requests (gave up after {attempts} attempts)"
            ),
            Self::Backend { source, .. } => source.user_message(),
            Self::EmptyResponse { operation } => {
                format!("The generation service returned nothing for {operation}")
            }
            Self::MalformedResponse { operation, .. } => {
                format!("The generation service returned unusable content for {operation}")
            }
            Self::InvalidRequest { reason } => format!("Cannot build request: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::RateLimited { message, .. } => Some(message.clone()),
            Self::Backend { source, .. } => source.context(),
            Self::MalformedResponse { reason, .. } => Some(reason.clone()),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::RateLimited { .. } => vec![
                "Check the quota and billing status of your API key".to_string(),
                "Verify the API key environment variable points at the intended project"
                    .to_string(),
                "Raise [retry] max_retries or initial_delay_ms if bursts are expected".to_string(),
            ],
            Self::Backend { source, .. } => source.suggestions(),
            Self::EmptyResponse { .. } | Self::MalformedResponse { .. } => {
                vec!["Try again; generated content varies between calls".to_string()]
            }
            Self::InvalidRequest { .. } => vec!["Check the command arguments".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::RateLimited { .. } => ErrorCategory::ResourceLimits,
            Self::Backend { source, .. } => source.category(),
            Self::EmptyResponse { .. } | Self::MalformedResponse { .. } => {
                ErrorCategory::Generation
            }
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
        }
    }
}

impl UserFriendlyError for BambooError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::Generation(e) => e.user_message(),
            Self::Io(e) => format!("Input/output failed: {e}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Llm(e) => e.context(),
            Self::Generation(e) => e.context(),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::Generation(e) => e.suggestions(),
            Self::Io(_) => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Llm(e) => e.category(),
            Self::Generation(e) => e.category(),
            Self::Io(_) => ErrorCategory::Io,
        }
    }
}

impl BambooError {
    /// Render the error with category, context and suggestions for a terminal.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut out = format!("✗ [{}] {}", self.category(), self.user_message());
        if let Some(context) = self.context() {
            out.push_str(&format!("\n  {context}"));
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\n  Suggestions:");
            for s in suggestions {
                out.push_str(&format!("\n    • {s}"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_is_rate_limited() {
        assert!(LlmError::ProviderQuota("slow down".to_string()).is_rate_limited());
    }

    #[test]
    fn test_rate_limit_markers_in_message() {
        assert!(LlmError::Transport("status 429 Too Many Requests".to_string()).is_rate_limited());
        assert!(
            LlmError::ProviderOutage("{\"status\":\"RESOURCE_EXHAUSTED\"}".to_string())
                .is_rate_limited()
        );
        assert!(!LlmError::Transport("connection reset".to_string()).is_rate_limited());
    }

    #[test]
    fn test_auth_and_budget_are_never_rate_limited() {
        assert!(!LlmError::ProviderAuth("429".to_string()).is_rate_limited());
        assert!(
            !LlmError::BudgetExceeded {
                limit: 4,
                attempted: 5
            }
            .is_rate_limited()
        );
    }

    #[test]
    fn test_rate_limited_suggests_quota_and_credentials() {
        let err = GenerationError::RateLimited {
            operation: "feed".to_string(),
            attempts: 4,
            message: "429".to_string(),
        };
        let suggestions = err.suggestions().join("\n");
        assert!(suggestions.contains("quota"));
        assert!(suggestions.contains("API key"));
        assert_eq!(err.category(), ErrorCategory::ResourceLimits);
    }

    #[test]
    fn test_malformed_suggests_retry() {
        let err = GenerationError::MalformedResponse {
            operation: "analysis".to_string(),
            reason: "missing field `comments`".to_string(),
        };
        assert!(!err.is_rate_limited());
        assert!(err.suggestions()[0].contains("Try again"));
        assert!(err.to_string().contains("analysis"));
    }

    #[test]
    fn test_display_for_user_includes_suggestions() {
        let err = BambooError::Generation(GenerationError::RateLimited {
            operation: "feed".to_string(),
            attempts: 4,
            message: "quota".to_string(),
        });
        let text = err.display_for_user();
        assert!(text.contains("Resource Limits"));
        assert!(text.contains("Suggestions:"));
    }
}
