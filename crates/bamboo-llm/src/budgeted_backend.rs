//! Budgeted backend wrapper for call limiting
//!
//! Wraps any `LlmBackend` and enforces a limit on the number of invocations
//! per process. Retries count: every attempt made by the retry policy passes
//! through here and consumes a slot.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    calls: AtomicU32,
    limit: u32,
}

impl BudgetedBackend {
    #[must_use]
    pub fn new(inner: Box<dyn LlmBackend>, limit: u32) -> Self {
        debug!(limit = limit, "Creating BudgetedBackend");
        Self {
            inner,
            calls: AtomicU32::new(0),
            limit,
        }
    }

    /// Attempted calls so far, including rejected ones
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        // Counted before the call so failed attempts still consume budget
        let current = self.calls.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            let attempted = current.saturating_add(1);
            warn!(limit = self.limit, attempted = attempted, "Budget limit exceeded");
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }

        debug!(
            operation = %inv.operation,
            call_count = current + 1,
            limit = self.limit,
            "Budget check passed"
        );

        self.inner.invoke(inv).await
    }
}
