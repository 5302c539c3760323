use survose_utils::error::ConfigError;

use super::{Config, SUPPORTED_PROVIDERS};

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(stage_timeout) = self.defaults.stage_timeout {
            if stage_timeout < 5 {
                return Err(ConfigError::InvalidValue {
                    key: "stage_timeout".to_string(),
                    value: "must be at least 5 seconds".to_string(),
                });
            }
            if stage_timeout > 3600 {
                return Err(ConfigError::InvalidValue {
                    key: "stage_timeout".to_string(),
                    value: "exceeds maximum limit of 3600 seconds (1 hour)".to_string(),
                });
            }
        }

        if let Some(model) = &self.defaults.model
            && model.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                key: "model".to_string(),
                value: "must not be empty".to_string(),
            });
        }

        if let Some(provider) = &self.llm.provider
            && !SUPPORTED_PROVIDERS.contains(&provider.as_str())
        {
            return Err(ConfigError::InvalidValue {
                key: "provider".to_string(),
                value: format!(
                    "unknown provider '{provider}' (supported: {})",
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            });
        }

        if self.llm.budget == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "budget".to_string(),
                value: "must be greater than 0".to_string(),
            });
        }

        if let Some(gemini) = &self.llm.gemini {
            if let Some(temperature) = gemini.temperature
                && !(0.0..=2.0).contains(&temperature)
            {
                return Err(ConfigError::InvalidValue {
                    key: "temperature".to_string(),
                    value: format!("{temperature} is outside 0.0..=2.0"),
                });
            }
            if gemini.max_tokens == Some(0) {
                return Err(ConfigError::InvalidValue {
                    key: "max_tokens".to_string(),
                    value: "must be greater than 0".to_string(),
                });
            }
            if let Some(base_url) = &gemini.base_url
                && !(base_url.starts_with("https://") || base_url.starts_with("http://"))
            {
                return Err(ConfigError::InvalidValue {
                    key: "base_url".to_string(),
                    value: format!("'{base_url}' must start with http:// or https://"),
                });
            }
        }

        Ok(())
    }
}
