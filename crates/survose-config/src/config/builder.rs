use std::collections::HashMap;
use std::time::Duration;

use survose_utils::Stage;
use survose_utils::error::ConfigError;

use super::{
    Config, ConfigSource, DEFAULT_PROVIDER, Defaults, GeminiConfig, LlmConfig, StageConfig,
    StagesConfig,
};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Builder values ignore config files and environment variables.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use survose_config::Config;
    /// use survose_utils::Stage;
    ///
    /// let config = Config::builder()
    ///     .model("gemini-2.5-flash")
    ///     .stage_model(Stage::Analyzer, "gemini-2.5-pro")
    ///     .stage_timeout(Duration::from_secs(60))
    ///     .build()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.model_for_stage(Stage::Analyzer), "gemini-2.5-pro");
    /// assert_eq!(config.model_for_stage(Stage::Qa), "gemini-2.5-flash");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent builder for [`Config`].
///
/// All values set here are attributed to [`ConfigSource::Programmatic`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    model: Option<String>,
    stage_timeout: Option<Duration>,
    verbose: Option<bool>,
    llm_provider: Option<String>,
    budget: Option<u32>,
    gemini: Option<GeminiConfig>,
    stage_models: Vec<(Stage, String)>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default model for every stage.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Model override for one stage.
    #[must_use]
    pub fn stage_model(mut self, stage: Stage, model: impl Into<String>) -> Self {
        self.stage_models.push((stage, model.into()));
        self
    }

    /// Per-call timeout. Sub-second precision is dropped.
    #[must_use]
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn llm_provider(mut self, provider: impl Into<String>) -> Self {
        self.llm_provider = Some(provider.into());
        self
    }

    /// Maximum model calls per process.
    #[must_use]
    pub fn budget(mut self, budget: u32) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Replace the whole `[llm.gemini]` section.
    #[must_use]
    pub fn gemini(mut self, gemini: GeminiConfig) -> Self {
        self.gemini = Some(gemini);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a value is out of range.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let mut defaults = Defaults::default();
        let mut llm = LlmConfig::default();
        let mut stages = StagesConfig::default();

        source_attribution.insert("model".to_string(), ConfigSource::Defaults);
        source_attribution.insert("stage_timeout".to_string(), ConfigSource::Defaults);
        source_attribution.insert("verbose".to_string(), ConfigSource::Defaults);

        if let Some(model) = self.model {
            defaults.model = Some(model);
            source_attribution.insert("model".to_string(), ConfigSource::Programmatic);
        }
        if let Some(timeout) = self.stage_timeout {
            defaults.stage_timeout = Some(timeout.as_secs());
            source_attribution.insert("stage_timeout".to_string(), ConfigSource::Programmatic);
        }
        if let Some(verbose) = self.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Programmatic);
        }

        match self.llm_provider {
            Some(provider) => {
                llm.provider = Some(provider);
                source_attribution.insert("llm_provider".to_string(), ConfigSource::Programmatic);
            }
            None => {
                llm.provider = Some(DEFAULT_PROVIDER.to_string());
                source_attribution.insert("llm_provider".to_string(), ConfigSource::Defaults);
            }
        }
        if let Some(budget) = self.budget {
            llm.budget = Some(budget);
            source_attribution.insert("llm_budget".to_string(), ConfigSource::Programmatic);
        }
        if let Some(gemini) = self.gemini {
            llm.gemini = Some(gemini);
            source_attribution.insert("llm_gemini_config".to_string(), ConfigSource::Programmatic);
        }

        if !self.stage_models.is_empty() {
            for (stage, model) in self.stage_models {
                let slot = match stage {
                    Stage::Creator => &mut stages.creator,
                    Stage::Qa => &mut stages.qa,
                    Stage::Questioner => &mut stages.questioner,
                    Stage::Analyzer => &mut stages.analyzer,
                    Stage::Suggestions => &mut stages.suggestions,
                };
                *slot = Some(StageConfig { model: Some(model) });
            }
            source_attribution.insert("stages".to_string(), ConfigSource::Programmatic);
        }

        let config = Config {
            defaults,
            llm,
            stages,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }
}
