//! Exit codes for the bamboo binary.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 70 | `GENERATION_FAILURE` | Generation failed for a reason other than rate limiting |
//! | 75 | `RATE_LIMITED` | Rate limited after the retry budget was spent |

use crate::error::{BambooError, GenerationError, LlmError};

/// Exit codes matching the table above.
///
/// ```rust
/// use bamboo_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::RATE_LIMITED.as_i32(), 75);
/// assert_eq!(ExitCode::SUCCESS, ExitCode::from_i32(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Generation failure - backend error or unusable response
    pub const GENERATION_FAILURE: ExitCode = ExitCode(70);

    /// Rate limited - quota exhausted after all retries (EX_TEMPFAIL)
    pub const RATE_LIMITED: ExitCode = ExitCode(75);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl BambooError {
    /// Map this error to the process exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Llm(LlmError::Misconfiguration(_) | LlmError::Unsupported(_)) => {
                ExitCode::CLI_ARGS
            }
            Self::Llm(e) if e.is_rate_limited() => ExitCode::RATE_LIMITED,
            Self::Llm(_) => ExitCode::GENERATION_FAILURE,
            Self::Generation(GenerationError::RateLimited { .. }) => ExitCode::RATE_LIMITED,
            Self::Generation(GenerationError::InvalidRequest { .. }) => ExitCode::CLI_ARGS,
            Self::Generation(_) => ExitCode::GENERATION_FAILURE,
            Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_config_errors_map_to_cli_args() {
        let err = BambooError::Config(ConfigError::MissingRequired("llm.model".to_string()));
        assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
    }

    #[test]
    fn test_rate_limited_is_distinct_from_generation_failure() {
        let limited = BambooError::Generation(GenerationError::RateLimited {
            operation: "feed".to_string(),
            attempts: 4,
            message: "429".to_string(),
        });
        let failed = BambooError::Generation(GenerationError::EmptyResponse {
            operation: "feed".to_string(),
        });
        assert_eq!(limited.to_exit_code(), ExitCode::RATE_LIMITED);
        assert_eq!(failed.to_exit_code(), ExitCode::GENERATION_FAILURE);
    }

    #[test]
    fn test_missing_api_key_is_cli_args() {
        let err = BambooError::Llm(LlmError::Misconfiguration("no key".to_string()));
        assert_eq!(err.to_exit_code().as_i32(), 2);
    }
}
