//! Deterministic backend for tests
//!
//! Replays queued completions (or errors) in order and records every
//! invocation it receives. Running out of responses is a `Transport` error so
//! a test that makes an unexpected extra call fails loudly.

use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use survose_utils::error::LlmError;

pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    invocations: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Backend that answers with `responses` in order.
    #[must_use]
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for response in responses {
            backend.push_response(response);
        }
        backend
    }

    pub fn push_response(&self, text: impl Into<String>) {
        self.lock_responses().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.lock_responses().push_back(Err(error));
    }

    /// Invocations received so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        self.invocations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.invocations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Responses not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock_responses().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        self.invocations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(inv);

        match self.lock_responses().pop_front() {
            Some(Ok(text)) => Ok(LlmResult::new(text, "scripted", model)),
            Some(Err(error)) => Err(error),
            None => Err(LlmError::Transport(
                "scripted backend has no responses left".to_string(),
            )),
        }
    }
}
