//! Shared HTTP client for hosted model providers
//!
//! One `reqwest` client per backend with connection pooling. Requests get a
//! per-call timeout capped by a global maximum. Each model call is exactly one
//! request: failures are mapped to `LlmError` and handed to the caller, never
//! retried here. Error messages are redacted before they leave this module.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use survose_utils::error::LlmError;
use survose_utils::redaction::redact_secrets;
use tracing::{debug, warn};

/// Upper bound for any single request, whatever the stage timeout says
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send `request_builder` once.
    ///
    /// # Errors
    ///
    /// - `ProviderAuth` for 401/403, `ProviderQuota` for 429, `Transport` for other 4xx
    /// - `ProviderOutage` for 5xx
    /// - `Timeout` when the request exceeds the effective timeout
    /// - `Transport` when the network fails
    pub async fn execute(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| {
                LlmError::Transport(redact_secrets(&format!("Failed to build request: {e}")))
            })?;

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
                let message = redact_secrets(&e.to_string());
                warn!(provider = provider_name, error = %message, "Network error");
                return Err(LlmError::Transport(format!(
                    "{provider_name} request failed: {message}"
                )));
            }
        };

        let status = response.status();
        if status.is_client_error() {
            return Err(map_client_error(status, provider_name));
        }
        if status.is_server_error() {
            warn!(provider = provider_name, status = status.as_u16(), "Server error");
            return Err(LlmError::ProviderOutage(format!(
                "{provider_name} returned server error: {status}"
            )));
        }

        Ok(response)
    }
}

fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        _ => LlmError::Transport(format!("{provider_name} returned client error: {status}")),
    }
}
