//! Budgeted backend wrapper for model call limiting
//!
//! Wraps any `LlmBackend` and refuses invocations once a per-process limit
//! is reached. Used for cost control on hosted providers.

use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use survose_utils::error::LlmError;
use tracing::{debug, warn};

/// Default limit on model calls per process
pub(crate) const DEFAULT_BUDGET_LIMIT: u32 = 20;

/// Environment variable overriding the limit
pub const BUDGET_ENV_VAR: &str = "SURVOSE_LLM_BUDGET";

/// A wrapper that enforces a limit on invocations.
///
/// The budget counts attempted calls, not successful ones: a failed call
/// still consumes its slot, so retry loops cannot bypass the limit.
pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    budget: Arc<AtomicU32>,
    limit: u32,
}

impl BudgetedBackend {
    pub fn new(inner: Box<dyn LlmBackend>, limit: u32) -> Self {
        debug!(limit = limit, "Creating BudgetedBackend");
        Self {
            inner,
            budget: Arc::new(AtomicU32::new(0)),
            limit,
        }
    }

    /// Create a budgeted backend with the limit resolved from configuration.
    ///
    /// Precedence (highest to lowest):
    /// 1. `SURVOSE_LLM_BUDGET`
    /// 2. `[llm] budget`
    /// 3. Default (20 calls per process)
    ///
    /// An unparseable environment value is ignored.
    pub fn with_limit_from_config(inner: Box<dyn LlmBackend>, config_budget: Option<u32>) -> Self {
        let env_limit = std::env::var(BUDGET_ENV_VAR)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok());

        let limit = match (env_limit, config_budget) {
            (Some(limit), _) => {
                debug!(limit, "Using budget limit from {}", BUDGET_ENV_VAR);
                limit
            }
            (None, Some(limit)) => {
                debug!(limit, "Using budget limit from config file");
                limit
            }
            (None, None) => DEFAULT_BUDGET_LIMIT,
        };

        Self::new(inner, limit)
    }

    /// Calls attempted so far, including refused ones.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.budget.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let current = self.budget.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            warn!(
                limit = self.limit,
                attempted = current + 1,
                stage = %inv.stage,
                "Model call budget exceeded"
            );
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted: current + 1,
            });
        }

        debug!(
            call_number = current + 1,
            limit = self.limit,
            stage = %inv.stage,
            "Invoking budgeted backend"
        );

        let result = self.inner.invoke(inv).await;

        match &result {
            Ok(_) => debug!(call_number = current + 1, "Budgeted call succeeded"),
            Err(e) => debug!(call_number = current + 1, error = %e, "Budgeted call failed"),
        }

        result
    }
}
