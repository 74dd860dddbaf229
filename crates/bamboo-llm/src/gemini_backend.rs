//! Gemini HTTP backend
//!
//! Calls the `models/{model}:generateContent` endpoint. When the invocation
//! carries a response schema the request asks for `application/json` output
//! constrained by that schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::schema::Schema;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Role};

/// Default Gemini API root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "gemini";

#[derive(Debug, Clone, Default)]
pub(crate) struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

#[derive(Clone)]
pub(crate) struct GeminiBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: GenerationParams,
}

impl GeminiBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: GenerationParams,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            default_model,
            default_params,
        })
    }

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment
    /// variable is unset or empty.
    pub fn new_from_config(config: &bamboo_config::Config) -> Result<Self, LlmError> {
        let api_key_env = config.api_key_env();
        let api_key = std::env::var(&api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "Gemini API key not found in environment variable '{api_key_env}'. \
                     Set this variable or configure a different api_key_env in [llm]."
                ))
            })?;

        let params = GenerationParams {
            temperature: config.llm.temperature,
            max_output_tokens: config.llm.max_output_tokens,
        };

        Self::new(api_key, config.llm.base_url.clone(), config.model(), params)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Model and parameters for this invocation; invocation metadata wins
    fn resolve(&self, inv: &LlmInvocation) -> (String, GenerationParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };
        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(serde_json::Value::as_f64)
            .map(|t| t as f32)
            .or(self.default_params.temperature);
        let max_output_tokens = inv
            .metadata
            .get("max_output_tokens")
            .and_then(serde_json::Value::as_u64)
            .and_then(|t| u32::try_from(t).ok())
            .or(self.default_params.max_output_tokens);
        (
            model,
            GenerationParams {
                temperature,
                max_output_tokens,
            },
        )
    }

    pub(crate) fn build_request(inv: &LlmInvocation, params: &GenerationParams) -> GeminiRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();
        for msg in &inv.messages {
            let part = Part {
                text: msg.content.clone(),
            };
            match msg.role {
                Role::System => system_parts.push(part),
                Role::User => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
                Role::Assistant => contents.push(Content {
                    role: Some("model".to_string()),
                    parts: vec![part],
                }),
            }
        }

        let system_instruction = (!system_parts.is_empty()).then_some(Content {
            role: None,
            parts: system_parts,
        });

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                response_mime_type: inv
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: inv.response_schema.clone(),
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        }
    }
}

/// Concatenate the text parts of the first candidate
pub(crate) fn extract_text(response: &GeminiResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let content = candidate.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve(&inv);

        debug!(
            provider = PROVIDER,
            operation = %inv.operation,
            model = %model,
            structured = inv.response_schema.is_some(),
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini backend"
        );

        let body = Self::build_request(&inv, &params);
        let request = self
            .client
            .post(&self.endpoint(&model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body);

        let response = self.client.execute(request, inv.timeout, PROVIDER).await?;

        let response_body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse Gemini response: {e}")))?;

        let finish_reason = response_body
            .candidates
            .first()
            .and_then(|c| c.finish_reason.clone());
        let usage = response_body.usage_metadata.clone();

        // Empty text is left for the caller to classify
        let text = extract_text(&response_body).unwrap_or_default();

        let mut result = LlmResult::new(text, PROVIDER, model);
        result.finish_reason = finish_reason;
        if let Some(usage) = usage {
            result.tokens_input = usage.prompt_token_count;
            result.tokens_output = usage.candidates_token_count;
        }

        debug!(
            provider = PROVIDER,
            operation = %inv.operation,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            finish_reason = ?result.finish_reason,
            "Gemini invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<ResponseContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    pub prompt_token_count: Option<u64>,
    pub candidates_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_request_body_for_structured_call() {
        let inv = LlmInvocation::new(
            "feed",
            "gemini-3-flash-preview",
            Duration::from_secs(30),
            vec![Message::system("persona"), Message::user("write posts")],
        )
        .with_schema(Schema::array(Schema::string()));

        let body = GeminiBackend::build_request(
            &inv,
            &GenerationParams {
                temperature: Some(1.0),
                max_output_tokens: None,
            },
        );
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "write posts"}]}],
                "systemInstruction": {"parts": [{"text": "persona"}]},
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "ARRAY", "items": {"type": "STRING"}},
                    "temperature": 1.0
                }
            })
        );
    }

    #[test]
    fn test_plain_call_has_no_mime_type() {
        let inv = LlmInvocation::new(
            "plain",
            "m",
            Duration::from_secs(5),
            vec![Message::user("hi")],
        );
        let body = GeminiBackend::build_request(&inv, &GenerationParams::default());
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["generationConfig"], json!({}));
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "[{\"a\":"}, {"text": "1}]"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        }))
        .unwrap();
        assert_eq!(extract_text(&response).as_deref(), Some("[{\"a\":1}]"));
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert!(extract_text(&response).is_none());

        let blocked: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert!(extract_text(&blocked).is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = GeminiBackend::new(
            "key".to_string(),
            Some("http://localhost:8080/v1beta/".to_string()),
            "gemini-3-flash-preview".to_string(),
            GenerationParams::default(),
        )
        .unwrap();
        assert_eq!(
            backend.endpoint("gemini-3-flash-preview"),
            "http://localhost:8080/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_metadata_overrides_defaults() {
        let backend = GeminiBackend::new(
            "key".to_string(),
            None,
            "default-model".to_string(),
            GenerationParams {
                temperature: Some(0.5),
                max_output_tokens: Some(100),
            },
        )
        .unwrap();
        let inv = LlmInvocation::new("feed", "", Duration::from_secs(5), vec![])
            .with_metadata("temperature", json!(1.5));
        let (model, params) = backend.resolve(&inv);
        assert_eq!(model, "default-model");
        assert_eq!(params.temperature, Some(1.5));
        assert_eq!(params.max_output_tokens, Some(100));
    }
}
