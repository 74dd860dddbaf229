//! Content generator
//!
//! One method per generation operation. Each builds a request with the prompt
//! builders, sends it through the backend under the retry policy and hands the
//! text to the normalizer. Settings are passed in on every call; nothing here
//! reads ambient state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{Instrument, debug};

use bamboo_config::Config;
use bamboo_llm::{LlmBackend, LlmError, LlmInvocation, Message, RetryPolicy};
use bamboo_utils::error::GenerationError;
use bamboo_utils::logging::{
    generation_span, log_generation_complete, log_generation_error, log_generation_start,
};

use crate::model::{Article, Comment, DmSimulationResult, Reply, SimulationResult, SimulationSettings};
use crate::normalize;
use crate::prompts::{self, GenerationRequest, Operation};

/// Persona given to every request as a system instruction
const SYSTEM_PERSONA: &str = "당신은 한국 고등학교 익명 커뮤니티(대나무숲)의 시뮬레이션 엔진입니다. \
항상 요청된 JSON 스키마에 맞춰 응답하세요.";

pub struct ContentGenerator {
    backend: Arc<dyn LlmBackend>,
    retry: RetryPolicy,
    model: String,
    timeout: Duration,
}

impl ContentGenerator {
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        retry: RetryPolicy,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            retry,
            model: model.into(),
            timeout,
        }
    }

    /// Generator backed by the provider named in `config`.
    ///
    /// # Errors
    ///
    /// Propagates backend construction failures (unknown provider, missing key).
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let backend: Arc<dyn LlmBackend> = Arc::from(bamboo_llm::from_config(config)?);
        Ok(Self::new(
            backend,
            RetryPolicy::from_config(config),
            config.model(),
            config.request_timeout(),
        ))
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `request` and return the raw text under the retry policy.
    async fn invoke(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let operation = request.operation;
        let invocation = LlmInvocation::new(
            operation.as_str(),
            self.model.clone(),
            self.timeout,
            vec![Message::system(SYSTEM_PERSONA), Message::user(request.prompt)],
        )
        .with_schema(request.schema);

        let result = self
            .retry
            .execute_with_retry(operation.as_str(), || {
                self.backend.invoke(invocation.clone())
            })
            .await
            .map_err(|source| self.classify(operation, source))?;

        debug!(
            operation = %operation,
            provider = %result.provider,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Generation service answered"
        );
        Ok(result.raw_response)
    }

    /// A rate-limited error out of the policy means every attempt was spent.
    fn classify(&self, operation: Operation, source: LlmError) -> GenerationError {
        if source.is_rate_limited() {
            GenerationError::RateLimited {
                operation: operation.to_string(),
                attempts: self.retry.max_attempts(),
                message: source.to_string(),
            }
        } else {
            GenerationError::Backend {
                operation: operation.to_string(),
                source,
            }
        }
    }

    /// Invoke, normalize and log one operation.
    async fn run<T>(
        &self,
        request: GenerationRequest,
        article_id: Option<&str>,
        items: impl Fn(&T) -> usize,
        normalize: impl FnOnce(&str) -> Result<T, GenerationError>,
    ) -> Result<T, GenerationError> {
        let operation = request.operation;
        let span = generation_span(operation.as_str(), article_id);
        async {
            let started = Instant::now();
            log_generation_start(operation.as_str(), &self.model);

            let outcome = match self.invoke(request).await {
                Ok(text) => normalize(&text),
                Err(e) => Err(e),
            };

            let elapsed = started.elapsed().as_millis();
            match &outcome {
                Ok(value) => log_generation_complete(operation.as_str(), elapsed, items(value)),
                Err(e) => log_generation_error(operation.as_str(), &e.to_string(), elapsed),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Generate `count` new posts.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a count outside 1..=20, otherwise any generation failure.
    pub async fn fetch_feed(
        &self,
        count: u32,
        settings: SimulationSettings,
    ) -> Result<Vec<Article>, GenerationError> {
        let request = prompts::feed_request(count, settings)?;
        self.run(request, None, Vec::len, |text| {
            normalize::normalize_feed(text, Utc::now())
        })
        .await
    }

    /// Generate the comment thread and indices for `article` as it is now,
    /// including its shadow-ban flag.
    ///
    /// # Errors
    ///
    /// Any generation failure.
    pub async fn analyze(
        &self,
        article: &Article,
        settings: SimulationSettings,
    ) -> Result<SimulationResult, GenerationError> {
        let request = prompts::analysis_request(article, settings.spicy);
        self.run(
            request,
            Some(&article.id.0),
            |r: &SimulationResult| r.comments.len(),
            |text| normalize::normalize_analysis(text, article),
        )
        .await
    }

    /// Generate the one reply reacting to the operator's reply on `comment`.
    ///
    /// # Errors
    ///
    /// Any generation failure.
    pub async fn react_to_reply(
        &self,
        article: &Article,
        comment: &Comment,
        reply_text: &str,
        identity_revealed: bool,
    ) -> Result<Reply, GenerationError> {
        let request =
            prompts::reply_reaction_request(article, comment, reply_text, identity_revealed);
        self.run(
            request,
            Some(&article.id.0),
            |_| 1,
            |text| normalize::normalize_reply_reaction(text, article),
        )
        .await
    }

    /// Generate replies reacting to a new operator comment.
    ///
    /// # Errors
    ///
    /// Any generation failure.
    pub async fn react_to_new_comment(
        &self,
        article: &Article,
        comment: &Comment,
        identity_revealed: bool,
    ) -> Result<Vec<Reply>, GenerationError> {
        let request = prompts::new_comment_reaction_request(article, comment, identity_revealed);
        self.run(request, Some(&article.id.0), Vec::len, |text| {
            normalize::normalize_new_comment_reaction(text, article)
        })
        .await
    }

    /// Generate an intercepted private conversation of the author.
    ///
    /// # Errors
    ///
    /// Any generation failure.
    pub async fn simulate_intercept(
        &self,
        article: &Article,
    ) -> Result<DmSimulationResult, GenerationError> {
        let request = prompts::dm_request(article);
        self.run(
            request,
            Some(&article.id.0),
            |r: &DmSimulationResult| r.messages.len(),
            normalize::normalize_dm,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmergencyMode;
    use crate::test_support::sample_article;
    use bamboo_llm::ScriptedBackend;
    use serde_json::json;

    fn generator(backend: &Arc<ScriptedBackend>, max_retries: u32) -> ContentGenerator {
        ContentGenerator::new(
            backend.clone(),
            RetryPolicy::new(max_retries, Duration::from_millis(10)),
            "test-model",
            Duration::from_secs(5),
        )
    }

    fn post(title: &str) -> serde_json::Value {
        json!({"title": title, "content": "내용", "category": "비밀", "displayAuthor": "익명",
               "realName": "이하늘", "studentGrade": 2, "studentClass": 3, "likes": 4})
    }

    #[tokio::test]
    async fn test_feed_sends_schema_and_settings() {
        let backend = Arc::new(ScriptedBackend::new().respond_json(json!([post("a"), post("b")])));
        let generator = generator(&backend, 0);
        let settings = SimulationSettings {
            spicy: false,
            emergency: EmergencyMode::PoliceAlert,
        };

        let articles = generator.fetch_feed(2, settings).await.unwrap();
        assert_eq!(articles.len(), 2);

        let calls = backend.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, "feed");
        assert_eq!(calls[0].model, "test-model");
        assert!(calls[0].response_schema.is_some());
        assert!(calls[0].prompt_text().contains("경찰 수사"));
    }

    #[tokio::test]
    async fn test_invalid_count_never_reaches_backend() {
        let backend = Arc::new(ScriptedBackend::new());
        let err = generator(&backend, 0)
            .fetch_feed(0, SimulationSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest { .. }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhaustion_is_distinct() {
        let backend = Arc::new(
            ScriptedBackend::new().fail_times(LlmError::ProviderQuota("429".to_string()), 3),
        );
        let err = generator(&backend, 2)
            .analyze(&sample_article(), SimulationSettings::default())
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
        assert!(matches!(err, GenerationError::RateLimited { attempts: 3, .. }));
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_success() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .fail(LlmError::ProviderQuota("RESOURCE_EXHAUSTED".to_string()))
                .respond_json(json!([{"username": "ㅇㅇ", "realIdentity": "박서준", "content": "?", "likes": 0}])),
        );
        let article = sample_article();
        let comment = crate::test_support::student_comment("박서준", "ㅋㅋ");
        let reply = generator(&backend, 3)
            .react_to_reply(&article, &comment, "누구게", false)
            .await
            .unwrap();
        assert_eq!(reply.content, "?");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let backend = Arc::new(
            ScriptedBackend::new().fail(LlmError::ProviderAuth("bad key".to_string())),
        );
        let err = generator(&backend, 3)
            .simulate_intercept(&sample_article())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Backend { ref operation, .. } if operation == "dm-intercept"));
        assert!(!err.is_rate_limited());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_is_empty_response() {
        let backend = Arc::new(ScriptedBackend::new().respond(""));
        let err = generator(&backend, 0)
            .analyze(&sample_article(), SimulationSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn test_analysis_uses_current_shadow_ban_flag() {
        let backend = Arc::new(ScriptedBackend::new().respond_json(json!({
            "indices": {"teacherSuspicion": 1, "atmosphere": 2, "bullyingRisk": 3},
            "adminTip": "tip",
            "comments": [{"username": "ㅇㅇ", "realIdentity": "박서준", "content": "x", "likes": 0, "replies": []}]
        })));
        let article = sample_article().with_shadow_ban(true);
        let result = generator(&backend, 0)
            .analyze(&article, SimulationSettings::default())
            .await
            .unwrap();

        assert!(backend.invocations()[0].prompt_text().contains("적용됨"));
        assert_eq!(result.comments.len(), 1);
        assert_eq!(result.comments[0].content, normalize::FALLBACK_COMMENT);
    }
}
