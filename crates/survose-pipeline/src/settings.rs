//! Per-run settings derived from [`Config`].

use std::collections::HashMap;
use std::time::Duration;

use strum::IntoEnumIterator;
use survose_config::{Config, DEFAULT_MODEL, DEFAULT_STAGE_TIMEOUT_SECS};
use survose_utils::Stage;

/// Model, timeout and sampling settings for each stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Model for stages without an entry in `stage_models`
    pub default_model: String,
    pub stage_models: HashMap<Stage, String>,
    /// Deadline for a single model call
    pub stage_timeout: Duration,
    /// Overrides the provider's temperature when set
    pub temperature: Option<f32>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            stage_models: HashMap::new(),
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
            temperature: None,
        }
    }
}

impl PipelineSettings {
    /// Resolve every stage's model with the config precedence rules.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let stage_models = Stage::iter()
            .map(|stage| (stage, config.model_for_stage(stage)))
            .collect();

        Self {
            default_model: config.model_for_stage(Stage::Creator),
            stage_models,
            stage_timeout: config.stage_timeout(),
            temperature: None,
        }
    }

    #[must_use]
    pub fn model_for(&self, stage: Stage) -> &str {
        self.stage_models
            .get(&stage)
            .map_or(self.default_model.as_str(), String::as_str)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self.stage_models.clear();
        self
    }

    #[must_use]
    pub fn with_stage_model(mut self, stage: Stage, model: impl Into<String>) -> Self {
        self.stage_models.insert(stage, model.into());
        self
    }

    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.model_for(Stage::Analyzer), "gemini-2.5-flash");
        assert_eq!(settings.stage_timeout, Duration::from_secs(120));
        assert_eq!(settings.temperature, None);
    }

    #[test]
    fn test_from_config_resolves_stage_overrides() {
        let config = Config::builder()
            .model("gemini-2.5-flash-lite")
            .stage_model(Stage::Analyzer, "gemini-2.5-pro")
            .stage_timeout(Duration::from_secs(45))
            .build()
            .unwrap();

        let settings = PipelineSettings::from_config(&config);

        assert_eq!(settings.model_for(Stage::Creator), "gemini-2.5-flash-lite");
        assert_eq!(settings.model_for(Stage::Analyzer), "gemini-2.5-pro");
        assert_eq!(settings.stage_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_builder_methods() {
        let settings = PipelineSettings::default()
            .with_model("m1")
            .with_stage_model(Stage::Qa, "m2")
            .with_temperature(0.4);

        assert_eq!(settings.model_for(Stage::Creator), "m1");
        assert_eq!(settings.model_for(Stage::Qa), "m2");
        assert_eq!(settings.temperature, Some(0.4));
    }
}
