//! Gemini backend over the `generateContent` REST API
//!
//! Request shape:
//! - `contents`: user/assistant turns as `user`/`model` roles
//! - `systemInstruction`: all system messages joined by blank lines
//! - `generationConfig`: temperature, `maxOutputTokens`, and for JSON
//!   stages `responseMimeType: application/json` plus an optional
//!   `responseSchema`
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use survose_config::{Config, DEFAULT_MODEL};
use survose_utils::error::LlmError;
use tracing::debug;

use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, ResponseFormat, Role};

pub(crate) const PROVIDER_NAME: &str = "gemini";
pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(crate) const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
const JSON_MIME_TYPE: &str = "application/json";

/// Finish reasons that mean the candidate was withheld
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Generation parameters, overridable per invocation via metadata
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    /// `None` leaves the provider default in place
    pub temperature: Option<f32>,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: None,
        }
    }
}

pub(crate) struct GeminiBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl GeminiBackend {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            default_model,
            default_params,
        })
    }

    /// Build from `[llm.gemini]`, reading the API key from the configured
    /// environment variable.
    ///
    /// # Errors
    ///
    /// `Misconfiguration` when the key variable is unset or empty.
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let gemini = config.llm.gemini.clone().unwrap_or_default();

        let api_key_env = gemini
            .api_key_env
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        let api_key = std::env::var(&api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "Gemini API key environment variable '{api_key_env}' not found. \
                     Set it or point [llm.gemini] api_key_env at another variable."
                ))
            })?;

        let default_model = gemini
            .model
            .or_else(|| config.defaults.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut params = HttpParams::default();
        if let Some(max_tokens) = gemini.max_tokens {
            params.max_tokens = max_tokens;
        }
        params.temperature = gemini.temperature;

        Self::new(api_key, gemini.base_url, default_model, params)
    }

    /// Model and parameters for one call: invocation values win over defaults.
    fn resolve_params<'a>(&'a self, inv: &'a LlmInvocation) -> (&'a str, HttpParams) {
        let model = if inv.model.is_empty() {
            self.default_model.as_str()
        } else {
            inv.model.as_str()
        };

        let mut params = self.default_params.clone();
        if let Some(max_tokens) = inv
            .metadata
            .get("max_tokens")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
        {
            params.max_tokens = max_tokens;
        }
        if let Some(temperature) = inv.metadata.get("temperature").and_then(Value::as_f64) {
            params.temperature = Some(temperature as f32);
        }

        (model, params)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Split system messages out and map the rest onto Gemini turns.
    fn convert_messages(messages: &[Message]) -> (Option<Content>, Vec<Content>) {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let system_instruction = (!system.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part::text(system.join("\n\n"))],
        });

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(match m.role {
                    Role::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![Part::text(m.content.clone())],
            })
            .collect();

        (system_instruction, contents)
    }

    fn build_request(inv: &LlmInvocation, params: &HttpParams) -> GenerateContentRequest {
        let (system_instruction, contents) = Self::convert_messages(&inv.messages);

        let (response_mime_type, response_schema) = match &inv.response_format {
            ResponseFormat::Text => (None, None),
            ResponseFormat::Json => (Some(JSON_MIME_TYPE), None),
            ResponseFormat::JsonSchema(schema) => (Some(JSON_MIME_TYPE), Some(schema.clone())),
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
                response_mime_type,
                response_schema,
            },
        }
    }

    /// Turn a `generateContent` response body into an [`LlmResult`].
    ///
    /// A blocked prompt or a safety finish is a service error. Any other
    /// reply is returned as-is, even with no text, so callers decide whether
    /// an empty completion is usable.
    fn parse_response(body: &str, model: &str) -> Result<LlmResult, LlmError> {
        let response: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| LlmError::Transport(format!("Failed to parse Gemini response: {e}")))?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(LlmError::Transport(format!(
                "Gemini blocked the prompt ({reason})"
            )));
        }

        let candidate = response.candidates.first();
        if let Some(reason) = candidate
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
        {
            return Err(LlmError::Transport(format!(
                "Gemini stopped generating ({reason})"
            )));
        }

        let text: String = candidate
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            debug!(model = model, "Gemini returned an empty completion");
        }

        let mut result = LlmResult::new(
            text,
            PROVIDER_NAME,
            response.model_version.as_deref().unwrap_or(model),
        );
        if let Some(usage) = response.usage_metadata {
            result = result.with_tokens(
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0),
            );
        }
        if let Some(reason) = candidate.and_then(|c| c.finish_reason.clone()) {
            result = result.with_extension("finish_reason", Value::String(reason));
        }

        Ok(result)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);
        let body = Self::build_request(&inv, &params);

        debug!(
            provider = PROVIDER_NAME,
            request_id = %inv.request_id,
            stage = %inv.stage,
            model = model,
            max_tokens = params.max_tokens,
            temperature = ?params.temperature,
            json = inv.response_format.is_json(),
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini"
        );

        let request = self
            .client
            .post(&self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute(request, inv.timeout, PROVIDER_NAME)
            .await?;

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to read Gemini response: {e}")))?;

        Self::parse_response(&text, model)
    }
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use survose_config::GeminiConfig;
    use survose_utils::Stage;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn backend(base_url: Option<String>) -> GeminiBackend {
        GeminiBackend::new(
            "test-key".to_string(),
            base_url,
            "default-model".to_string(),
            HttpParams {
                max_tokens: 1024,
                temperature: Some(0.5),
            },
        )
        .unwrap()
    }

    fn invocation(model: &str, messages: Vec<Message>) -> LlmInvocation {
        LlmInvocation::new("req-1", Stage::Creator, model, Duration::from_secs(10), messages)
    }

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (base_url, handle)
    }

    #[test]
    fn test_resolve_params_uses_defaults() {
        let backend = backend(None);
        let inv = invocation("", vec![]);

        let (model, params) = backend.resolve_params(&inv);

        assert_eq!(model, "default-model");
        assert_eq!(params.max_tokens, 1024);
        assert_eq!(params.temperature, Some(0.5));
    }

    #[test]
    fn test_resolve_params_overrides() {
        let backend = backend(None);
        let inv = invocation("gemini-2.5-pro", vec![])
            .with_metadata("max_tokens", json!(2048))
            .with_metadata("temperature", json!(0.1));

        let (model, params) = backend.resolve_params(&inv);

        assert_eq!(model, "gemini-2.5-pro");
        assert_eq!(params.max_tokens, 2048);
        assert_eq!(params.temperature, Some(0.1));
    }

    #[test]
    fn test_convert_messages_maps_roles() {
        let messages = vec![
            Message::system("Be brief"),
            Message::system("Answer in JSON"),
            Message::user("Hello"),
            Message::assistant("Hi"),
        ];

        let (system, contents) = GeminiBackend::convert_messages(&messages);

        let system = system.unwrap();
        assert_eq!(
            system.parts[0].text.as_deref(),
            Some("Be brief\n\nAnswer in JSON")
        );
        assert!(system.role.is_none());
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn test_request_body_for_schema_stage() {
        let schema = json!({"type": "OBJECT", "properties": {}});
        let inv = invocation("m", vec![Message::system("sys"), Message::user("survey")])
            .with_response_format(ResponseFormat::JsonSchema(schema.clone()));
        let params = HttpParams {
            max_tokens: 512,
            temperature: Some(0.3),
        };

        let body = serde_json::to_value(GeminiBackend::build_request(&inv, &params)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "survey");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_request_body_for_text_stage_omits_json_fields() {
        let inv = invocation("m", vec![Message::user("hi")]);
        let body =
            serde_json::to_value(GeminiBackend::build_request(&inv, &HttpParams::default()))
                .unwrap();

        let config = body["generationConfig"].as_object().unwrap();
        assert!(!config.contains_key("responseMimeType"));
        assert!(!config.contains_key("responseSchema"));
        assert!(!config.contains_key("temperature"));
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_response_joins_parts_and_reads_usage() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"title\":"}, {"text": "\"T\"}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5},
            "modelVersion": "gemini-2.5-flash-001"
        })
        .to_string();

        let result = GeminiBackend::parse_response(&body, "gemini-2.5-flash").unwrap();

        assert_eq!(result.raw_response, "{\"title\":\"T\"}");
        assert_eq!(result.provider, "gemini");
        assert_eq!(result.model_used, "gemini-2.5-flash-001");
        assert_eq!(result.tokens_input, Some(10));
        assert_eq!(result.tokens_output, Some(5));
        assert_eq!(result.extensions["finish_reason"], json!("STOP"));
    }

    #[test]
    fn test_parse_response_blocked_prompt() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string();
        match GeminiBackend::parse_response(&body, "m") {
            Err(LlmError::Transport(msg)) => assert!(msg.contains("SAFETY"), "{msg}"),
            other => panic!("Expected Transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_safety_finish_is_error() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "partial"}]}, "finishReason": "SAFETY"}]
        })
        .to_string();
        match GeminiBackend::parse_response(&body, "m") {
            Err(LlmError::Transport(msg)) => assert!(msg.contains("SAFETY"), "{msg}"),
            other => panic!("Expected Transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_empty_completion_is_ok() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":""}]},"finishReason":"STOP"}]}"#;
        let result = GeminiBackend::parse_response(body, "m").unwrap();
        assert_eq!(result.raw_response, "");
        assert_eq!(result.extensions["finish_reason"], json!("STOP"));

        let result = GeminiBackend::parse_response("{}", "m").unwrap();
        assert_eq!(result.raw_response, "");
    }

    #[test]
    fn test_parse_response_malformed_body() {
        assert!(matches!(
            GeminiBackend::parse_response("<html>", "m"),
            Err(LlmError::Transport(_))
        ));
    }

    #[test]
    #[serial_test::serial]
    fn test_new_from_config_missing_api_key() {
        let env_var = "SURVOSE_TEST_GEMINI_KEY_MISSING";
        // SAFETY: serialized with the other env-mutating tests in this crate
        unsafe {
            std::env::remove_var(env_var);
        }

        let mut config = Config::minimal_for_testing();
        config.llm.gemini = Some(GeminiConfig {
            api_key_env: Some(env_var.to_string()),
            ..GeminiConfig::default()
        });

        match GeminiBackend::new_from_config(&config) {
            Err(LlmError::Misconfiguration(msg)) => {
                assert!(msg.contains(env_var), "{msg}");
                assert!(msg.contains("not found"), "{msg}");
            }
            Err(other) => panic!("Expected Misconfiguration, got {other:?}"),
            Ok(_) => panic!("Expected Misconfiguration, got a backend"),
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_new_from_config_reads_section() {
        let env_var = "SURVOSE_TEST_GEMINI_KEY_PRESENT";
        // SAFETY: serialized with the other env-mutating tests in this crate
        unsafe {
            std::env::set_var(env_var, "secret");
        }

        let mut config = Config::minimal_for_testing();
        config.llm.gemini = Some(GeminiConfig {
            api_key_env: Some(env_var.to_string()),
            base_url: Some("http://localhost:9999/v1beta/".to_string()),
            model: Some("gemini-2.5-pro".to_string()),
            temperature: Some(0.2),
            max_tokens: Some(256),
        });

        let backend = GeminiBackend::new_from_config(&config).unwrap();

        assert_eq!(backend.api_key, "secret");
        assert_eq!(backend.default_model, "gemini-2.5-pro");
        assert_eq!(backend.default_params.max_tokens, 256);
        assert_eq!(backend.default_params.temperature, Some(0.2));
        assert_eq!(
            backend.endpoint("gemini-2.5-pro"),
            "http://localhost:9999/v1beta/models/gemini-2.5-pro:generateContent"
        );

        // SAFETY: as above
        unsafe {
            std::env::remove_var(env_var);
        }
    }

    #[tokio::test]
    async fn test_invoke_round_trip_against_local_server() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"approved\": true}"}]}}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 4}
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", body).await;

        let backend = backend(Some(format!("{base_url}/v1beta")));
        let inv = invocation("gemini-2.5-flash", vec![Message::user("compare")])
            .with_response_format(ResponseFormat::Json);

        let result = backend.invoke(inv).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(result.raw_response, "{\"approved\": true}");
        assert!(request.starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent"));
        assert!(request.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
        assert!(!request.contains("key=test-key"));
        assert!(request.contains("\"responseMimeType\":\"application/json\""));
    }

    #[tokio::test]
    async fn test_invoke_maps_auth_failure() {
        let (base_url, server) = serve_once("403 Forbidden", "{}".to_string()).await;

        let backend = backend(Some(base_url));
        let err = backend
            .invoke(invocation("m", vec![Message::user("x")]))
            .await
            .unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, LlmError::ProviderAuth(_)), "got {err:?}");
    }
}
