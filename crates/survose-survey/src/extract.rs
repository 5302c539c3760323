//! Pull the JSON payload out of a model completion.
//!
//! Models are told to answer with bare JSON but often wrap it in a fenced
//! code block anyway. The first fenced block wins when one is present.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?i:json)?\s*(.*?)```").unwrap());

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonExtractError {
    #[error("response is empty")]
    Empty,
    #[error("response is not valid JSON: {0}")]
    Invalid(String),
}

/// Parse the JSON carried by `text`.
///
/// The text is trimmed; if it contains a fenced block (with or without a
/// `json` tag) the block's content is parsed, otherwise the whole text.
///
/// ```rust
/// use serde_json::json;
/// use survose_survey::extract_json;
///
/// let text = "Here you go:\n```json\n{\"approved\": true}\n```";
/// assert_eq!(extract_json(text).unwrap(), json!({"approved": true}));
/// ```
pub fn extract_json(text: &str) -> Result<Value, JsonExtractError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(JsonExtractError::Empty);
    }

    let payload = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str().trim());

    serde_json::from_str(payload).map_err(|e| JsonExtractError::Invalid(e.to_string()))
}
