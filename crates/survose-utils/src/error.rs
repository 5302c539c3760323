use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;
use crate::redaction::redact_secrets;

/// Main error type for survose operations
#[derive(Error, Debug)]
pub enum SurvoseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Voice script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Invalid survey input from {source_name}: {reason}")]
    InvalidSurvey { source_name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Generation,
    ModelService,
    FileSystem,
    ResourceLimits,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Generation => write!(f, "Survey Generation"),
            Self::ModelService => write!(f, "Model Service"),
            Self::FileSystem => write!(f, "File System"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
            Self::Validation => write!(f, "Validation"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => {
                format!("Required configuration '{key}' is missing")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [defaults], [llm] and [stages] sections."
                    .to_string(),
            ),
            Self::MissingRequired(_) => None,
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::NotFound { .. } => Some(
                "survose searches for .survose/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Remove unknown keys from the configuration file".to_string(),
            ],
            Self::MissingRequired(key) => vec![format!(
                "Add '{key}' to .survose/config.toml or pass it on the command line"
            )],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "stage_timeout" => vec!["Use a stage timeout between 5 and 3600 seconds".to_string()],
                "temperature" => vec!["Use a temperature between 0.0 and 2.0".to_string()],
                "provider" => vec!["Set [llm] provider = \"gemini\"".to_string()],
                _ => vec![format!("Check the documented values for '{key}'")],
            },
            Self::NotFound { path } => vec![
                format!("Create the file at {path} or drop the --config flag"),
                "Run without a configuration file to use built-in defaults".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors that can occur during LLM backend operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed provider response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Budget limit exceeded
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("Model service transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("Model provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("Model provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("Model provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("Model invocation timed out after {duration:?}")
            }
            Self::BudgetExceeded { limit, attempted } => {
                format!("Model call budget exceeded: attempted {attempted} calls, limit is {limit}")
            }
            Self::Misconfiguration(msg) => format!("Model configuration error: {msg}"),
            Self::Unsupported(msg) => format!("Model feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => {
                Some("The generative text service could not be reached or returned an unreadable response.".to_string())
            }
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate a missing or invalid API key.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Each pipeline stage is bounded by the configured stage timeout.".to_string(),
            ),
            Self::BudgetExceeded { .. } => {
                Some("The call budget caps how many model calls one process may attempt.".to_string())
            }
            Self::Misconfiguration(_) => Some(
                "The [llm] section of .survose/config.toml is missing or invalid values."
                    .to_string(),
            ),
            Self::Unsupported(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec![
                "Verify network connectivity to the provider".to_string(),
                "Try running with --verbose to see detailed error information".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that GEMINI_API_KEY (or the configured api_key_env) is set".to_string(),
                "Verify the API key is valid and not expired".to_string(),
            ],
            Self::ProviderQuota(_) | Self::ProviderOutage(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Check the provider's status page and usage dashboard".to_string(),
            ],
            Self::Timeout { .. } => vec![
                "Increase the timeout with --stage-timeout or [defaults] stage_timeout".to_string(),
                "Check your internet connection".to_string(),
            ],
            Self::BudgetExceeded { .. } => vec![
                "Raise the limit with SURVOSE_LLM_BUDGET or [llm] budget".to_string(),
            ],
            Self::Misconfiguration(_) => vec![
                "Check the [llm] and [llm.gemini] sections in .survose/config.toml".to_string(),
            ],
            Self::Unsupported(_) => vec!["Use the 'gemini' provider".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) | Self::Timeout { .. } => {
                ErrorCategory::ModelService
            }
            Self::ProviderQuota(_) | Self::BudgetExceeded { .. } => ErrorCategory::ResourceLimits,
            Self::ProviderAuth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
        }
    }
}

/// A pipeline stage response broke its JSON contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Survey prompt is empty")]
    EmptyPrompt,

    #[error("{stage} returned invalid JSON: {reason}")]
    InvalidJson { stage: String, reason: String },

    #[error("{stage} response is missing '{field}'")]
    MissingField { stage: String, field: String },

    #[error("{stage} returned a survey without questions")]
    EmptySurvey { stage: String },

    #[error("{stage} response has unexpected shape: expected {expected}")]
    UnexpectedShape { stage: String, expected: String },
}

impl GenerationError {
    /// Stage that produced the failure, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::EmptyPrompt => None,
            Self::InvalidJson { stage, .. }
            | Self::MissingField { stage, .. }
            | Self::EmptySurvey { stage }
            | Self::UnexpectedShape { stage, .. } => Some(stage),
        }
    }
}

impl UserFriendlyError for GenerationError {
    fn user_message(&self) -> String {
        match self {
            Self::EmptyPrompt => "Describe the survey you want to generate".to_string(),
            other => format!("Survey generation failed: {other}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::EmptyPrompt => None,
            _ => Some(
                "Every pipeline stage must answer with JSON in a fixed shape; the model's answer did not."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::EmptyPrompt => vec![
                "Pass the topic as an argument: survose generate \"customer satisfaction\"".to_string(),
            ],
            _ => vec![
                "Run the command again; model output varies between calls".to_string(),
                "Try a different model with --model".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyPrompt => ErrorCategory::Validation,
            _ => ErrorCategory::Generation,
        }
    }
}

/// The voice script could not be assembled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("'questions' must be an array")]
    QuestionsNotArray,

    #[error("No valid questions to run ({skipped} skipped)")]
    NoValidQuestions { skipped: usize },
}

impl UserFriendlyError for ScriptError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::QuestionsNotArray => None,
            Self::NoValidQuestions { .. } => Some(
                "Questions need non-empty text, a known type, at least two choices or a valid range."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["Run 'survose normalize <FILE>' to repair the survey first".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

impl UserFriendlyError for SurvoseError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Llm(err) => err.user_message(),
            Self::Generation(err) => err.user_message(),
            Self::Script(err) => err.user_message(),
            Self::InvalidSurvey {
                source_name,
                reason,
            } => format!("Could not read survey from {source_name}: {reason}"),
            Self::Io(err) => format!("File system error: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Llm(err) => err.context(),
            Self::Generation(err) => err.context(),
            Self::Script(err) => err.context(),
            Self::InvalidSurvey { .. } => Some(
                "Survey files are JSON objects with a 'title' and a 'questions' array.".to_string(),
            ),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Llm(err) => err.suggestions(),
            Self::Generation(err) => err.suggestions(),
            Self::Script(err) => err.suggestions(),
            Self::InvalidSurvey { .. } => {
                vec!["Validate the file with a JSON linter".to_string()]
            }
            Self::Io(_) => vec!["Check that the path exists and is readable".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Llm(err) => err.category(),
            Self::Generation(err) => err.category(),
            Self::Script(err) => err.category(),
            Self::InvalidSurvey { .. } => ErrorCategory::Validation,
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl SurvoseError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// The rendered text is redacted before it is returned.
    ///
    /// ```rust
    /// use survose_utils::error::{GenerationError, SurvoseError};
    ///
    /// let err = SurvoseError::from(GenerationError::EmptyPrompt);
    /// let message = err.display_for_user();
    /// assert!(message.starts_with("Error: "));
    /// assert!(message.contains("Suggestions:"));
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        redact_secrets(&output)
    }

    /// Map this error to the CLI exit code.
    ///
    /// | Exit Code | Name | Description |
    /// |-----------|------|-------------|
    /// | 1 | INTERNAL | IO and other failures |
    /// | 2 | CLI_ARGS | Configuration or provider setup errors |
    /// | 3 | INVALID_SURVEY | Unusable survey input |
    /// | 10 | STAGE_TIMEOUT | Model call timed out |
    /// | 65 | GENERATION_FAILED | Stage JSON contract broken |
    /// | 70 | LLM_FAILURE | Model service failed |
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            SurvoseError::Config(_) => ExitCode::CLI_ARGS,
            SurvoseError::Llm(llm_err) => match llm_err {
                LlmError::Timeout { .. } => ExitCode::STAGE_TIMEOUT,
                LlmError::Misconfiguration(_) | LlmError::Unsupported(_) => ExitCode::CLI_ARGS,
                LlmError::Transport(_)
                | LlmError::ProviderAuth(_)
                | LlmError::ProviderQuota(_)
                | LlmError::ProviderOutage(_)
                | LlmError::BudgetExceeded { .. } => ExitCode::LLM_FAILURE,
            },
            SurvoseError::Generation(GenerationError::EmptyPrompt) => ExitCode::CLI_ARGS,
            SurvoseError::Generation(_) => ExitCode::GENERATION_FAILED,
            SurvoseError::Script(_) | SurvoseError::InvalidSurvey { .. } => {
                ExitCode::INVALID_SURVEY
            }
            SurvoseError::Io(_) => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let cases: Vec<(SurvoseError, ExitCode)> = vec![
            (
                ConfigError::InvalidValue {
                    key: "temperature".into(),
                    value: "3".into(),
                }
                .into(),
                ExitCode::CLI_ARGS,
            ),
            (
                LlmError::Timeout {
                    duration: Duration::from_secs(5),
                }
                .into(),
                ExitCode::STAGE_TIMEOUT,
            ),
            (LlmError::ProviderOutage("503".into()).into(), ExitCode::LLM_FAILURE),
            (LlmError::Unsupported("x".into()).into(), ExitCode::CLI_ARGS),
            (
                GenerationError::MissingField {
                    stage: "creator".into(),
                    field: "questions".into(),
                }
                .into(),
                ExitCode::GENERATION_FAILED,
            ),
            (GenerationError::EmptyPrompt.into(), ExitCode::CLI_ARGS),
            (ScriptError::QuestionsNotArray.into(), ExitCode::INVALID_SURVEY),
            (
                std::io::Error::other("disk").into(),
                ExitCode::INTERNAL,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_exit_code(), expected, "{err}");
        }
    }

    #[test]
    fn test_display_for_user_layout() {
        let err = SurvoseError::from(LlmError::ProviderAuth("401 Unauthorized".into()));
        let message = err.display_for_user();

        assert!(message.starts_with("Error: Model provider authentication failed"));
        assert!(message.contains("\nContext: "));
        assert!(message.contains("  • Check that GEMINI_API_KEY"));
    }

    #[test]
    fn test_display_for_user_redacts_secrets() {
        let err = SurvoseError::from(LlmError::Transport(
            "request to https://generativelanguage.googleapis.com/v1beta?key=AIzaSecretValue failed"
                .into(),
        ));
        let message = err.display_for_user();

        assert!(!message.contains("AIzaSecretValue"));
    }

    #[test]
    fn test_generation_error_stage() {
        let err = GenerationError::EmptySurvey {
            stage: "questioner".into(),
        };
        assert_eq!(err.stage(), Some("questioner"));
        assert_eq!(err.to_string(), "questioner returned a survey without questions");
        assert_eq!(GenerationError::EmptyPrompt.stage(), None);
    }

    #[test]
    fn test_script_error_messages() {
        assert_eq!(
            ScriptError::QuestionsNotArray.to_string(),
            "'questions' must be an array"
        );
        assert!(
            ScriptError::NoValidQuestions { skipped: 2 }
                .to_string()
                .starts_with("No valid questions to run")
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            LlmError::BudgetExceeded {
                limit: 1,
                attempted: 2
            }
            .category(),
            ErrorCategory::ResourceLimits
        );
        assert_eq!(ErrorCategory::ModelService.to_string(), "Model Service");
    }
}
