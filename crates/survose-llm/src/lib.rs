//! Generative model backends for survose
//!
//! Every provider implements [`LlmBackend`]; the pipeline only sees the trait.
//! [`from_config`] builds the configured provider wrapped in a
//! [`BudgetedBackend`].

mod budgeted_backend;
mod gemini_backend;
pub(crate) mod http_client;
#[cfg(any(test, feature = "test-utils"))]
mod scripted_backend;
mod types;

pub use budgeted_backend::{BUDGET_ENV_VAR, BudgetedBackend};
pub use survose_utils::error::LlmError;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, ResponseFormat, Role};

#[cfg(any(test, feature = "test-utils"))]
pub use scripted_backend::ScriptedBackend;

use gemini_backend::GeminiBackend;
use survose_config::{Config, SUPPORTED_PROVIDERS};

/// Construct a backend for a specific provider.
///
/// # Errors
///
/// `Unsupported` for an unknown provider, `Misconfiguration` when the
/// provider's own settings are unusable.
fn construct_backend_for_provider(
    provider: &str,
    config: &Config,
) -> Result<Box<dyn LlmBackend>, LlmError> {
    match provider {
        "gemini" => {
            let backend = GeminiBackend::new_from_config(config).map_err(|e| match e {
                LlmError::Misconfiguration(_) => e,
                other => LlmError::Misconfiguration(format!(
                    "Failed to create Gemini backend: {other}"
                )),
            })?;
            Ok(Box::new(backend))
        }
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: {}.",
            SUPPORTED_PROVIDERS.join(", ")
        ))),
    }
}

/// Build the configured backend, capped by the call budget.
///
/// # Errors
///
/// See [`construct_backend_for_provider`].
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    let provider = config.provider();
    tracing::debug!(provider = provider, "Constructing model backend");

    let inner = construct_backend_for_provider(provider, config)?;
    Ok(Box::new(BudgetedBackend::with_limit_from_config(
        inner,
        config.llm.budget,
    )))
}
