//! DM interception flow
//!
//! One-shot and independent of the comment thread: `Idle → Hacking →
//! Loaded | Failed`. A finished flow can be started again.

use tracing::info;

use bamboo_utils::error::GenerationError;

use crate::generator::ContentGenerator;
use crate::model::{Article, DmSimulationResult};

#[derive(Debug, Clone)]
pub enum InterceptState {
    Idle,
    Hacking,
    Loaded(DmSimulationResult),
    Failed(GenerationError),
}

pub struct DmIntercept {
    article: Article,
    state: InterceptState,
}

impl DmIntercept {
    #[must_use]
    pub fn new(article: Article) -> Self {
        Self {
            article,
            state: InterceptState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> &InterceptState {
        &self.state
    }

    #[must_use]
    pub fn transcript(&self) -> Option<&DmSimulationResult> {
        match &self.state {
            InterceptState::Loaded(result) => Some(result),
            _ => None,
        }
    }

    /// Enter `Hacking`. Returns `false` if an interception is already running.
    pub fn begin(&mut self) -> bool {
        if matches!(self.state, InterceptState::Hacking) {
            return false;
        }
        self.state = InterceptState::Hacking;
        true
    }

    pub fn complete(&mut self, outcome: Result<DmSimulationResult, GenerationError>) {
        self.state = match outcome {
            Ok(result) => {
                info!(
                    article_id = %self.article.id,
                    partner = %result.partner_name,
                    two_faced = result.two_faced,
                    "Conversation intercepted"
                );
                InterceptState::Loaded(result)
            }
            Err(e) => InterceptState::Failed(e),
        };
    }

    /// Run the whole flow against `generator`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if an interception is already running, otherwise the
    /// generation failure (also kept in the `Failed` state).
    pub async fn run(
        &mut self,
        generator: &ContentGenerator,
    ) -> Result<&DmSimulationResult, GenerationError> {
        if !self.begin() {
            return Err(GenerationError::InvalidRequest {
                reason: "interception already in progress".to_string(),
            });
        }
        let outcome = generator.simulate_intercept(&self.article).await;
        self.complete(outcome);
        match &self.state {
            InterceptState::Loaded(result) => Ok(result),
            InterceptState::Failed(e) => Err(e.clone()),
            InterceptState::Idle | InterceptState::Hacking => Err(GenerationError::InvalidRequest {
                reason: "interception did not complete".to_string(),
            }),
        }
    }
}
