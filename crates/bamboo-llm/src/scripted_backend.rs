//! Scripted backend for tests
//!
//! Replays a queue of canned responses and failures in order and records every
//! invocation it receives. An exhausted script fails with a transport error.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

#[derive(Debug)]
enum Step {
    Respond(String),
    Fail(LlmError),
}

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    invocations: Mutex<Vec<LlmInvocation>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw text response
    #[must_use]
    pub fn respond(self, text: impl Into<String>) -> Self {
        self.push_response(text);
        self
    }

    /// Queue a JSON response
    #[must_use]
    pub fn respond_json(self, value: serde_json::Value) -> Self {
        self.push_response(value.to_string());
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn fail(self, error: LlmError) -> Self {
        self.push_failure(error);
        self
    }

    /// Queue the same failure `times` times
    #[must_use]
    pub fn fail_times(self, error: LlmError, times: usize) -> Self {
        for _ in 0..times {
            self.push_failure(error.clone());
        }
        self
    }

    pub fn push_response(&self, text: impl Into<String>) {
        lock(&self.script).push_back(Step::Respond(text.into()));
    }

    pub fn push_failure(&self, error: LlmError) {
        lock(&self.script).push_back(Step::Fail(error));
    }

    /// Invocations received so far, oldest first
    #[must_use]
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        lock(&self.invocations).clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.invocations).len()
    }

    /// Steps not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        lock(&self.invocations).push(inv);
        let step = lock(&self.script).pop_front();
        match step {
            Some(Step::Respond(text)) => Ok(LlmResult::new(text, "scripted", model)),
            Some(Step::Fail(err)) => Err(err),
            None => Err(LlmError::Transport("scripted backend exhausted".to_string())),
        }
    }
}
