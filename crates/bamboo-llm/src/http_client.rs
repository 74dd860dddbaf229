//! Shared HTTP client for HTTP-based generation backends
//!
//! One `reqwest::Client` per backend, configured once. Requests are sent
//! exactly once: retry belongs to [`crate::RetryPolicy`], so a failed status is
//! mapped to an [`LlmError`] and returned straight away.

use bamboo_utils::redaction::redact_error_message;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::LlmError;

/// Default maximum HTTP timeout (10 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(600);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on how much of an error body is kept in the error message
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .use_rustls_tls()
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout: DEFAULT_MAX_HTTP_TIMEOUT,
        })
    }

    /// Start a POST request on the shared connection pool
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    /// Send the request once with timeout `min(request_timeout, max_timeout)`.
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403
    /// - `LlmError::ProviderQuota` for 429
    /// - `LlmError::ProviderOutage` for 5xx
    /// - `LlmError::Transport` for other 4xx and network errors
    /// - `LlmError::Timeout` when the deadline passes
    pub async fn execute(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("Failed to build request: {e}")))?;

        debug!(
            provider = provider_name,
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(LlmError::Timeout {
                    duration: effective_timeout,
                });
            }
            Err(e) => {
                return Err(LlmError::Transport(format!(
                    "{provider_name} request failed: {}",
                    redact_error_message(&e.to_string())
                )));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Provider error bodies carry the status name (e.g. RESOURCE_EXHAUSTED)
        let body = response.text().await.unwrap_or_default();
        let detail = redact_error_message(&truncate(&body, MAX_ERROR_BODY_CHARS));
        Err(map_status_error(status, provider_name, &detail))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Map a non-success HTTP status to an `LlmError`
pub(crate) fn map_status_error(status: StatusCode, provider_name: &str, detail: &str) -> LlmError {
    let detail = detail.trim();
    let suffix = if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(format!(
            "{provider_name} authentication failed ({status}){suffix}"
        )),
        StatusCode::TOO_MANY_REQUESTS => LlmError::ProviderQuota(format!(
            "{provider_name} rate limit exceeded ({status}){suffix}"
        )),
        s if s.is_server_error() => LlmError::ProviderOutage(format!(
            "{provider_name} returned server error ({status}){suffix}"
        )),
        _ => LlmError::Transport(format!(
            "{provider_name} returned client error ({status}){suffix}"
        )),
    }
}
