//! Configuration management for survose
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults. The TOML file supports `[defaults]`,
//! `[llm]`, `[llm.gemini]` and `[stages.<stage>]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::{CONFIG_DIR, CONFIG_FILE, PROVIDER_ENV_VAR};
pub use model::*;
pub use survose_utils::types::ConfigSource;

use std::collections::BTreeMap;
use std::time::Duration;

use survose_utils::Stage;

impl Config {
    /// Get the model to use for a specific stage.
    ///
    /// Precedence (highest to lowest):
    /// 1. Stage override (`[stages.<stage>].model`)
    /// 2. Global default (`[defaults].model`)
    /// 3. Provider default (`[llm.gemini].model`)
    /// 4. Hard default: `gemini-2.5-flash`
    ///
    /// ```toml
    /// [defaults]
    /// model = "gemini-2.5-flash"
    ///
    /// [stages.analyzer]
    /// model = "gemini-2.5-pro"
    /// ```
    #[must_use]
    pub fn model_for_stage(&self, stage: Stage) -> String {
        self.stages
            .get(stage)
            .and_then(|sc| sc.model.clone())
            .or_else(|| self.defaults.model.clone())
            .or_else(|| self.llm.gemini.as_ref().and_then(|g| g.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Per-call timeout.
    #[must_use]
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(
            self.defaults
                .stage_timeout
                .unwrap_or(DEFAULT_STAGE_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    /// Configured provider name (always set after discovery or build).
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// Effective configuration as `key -> (value, source)`, for `--verbose` output.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();
        let source_of = |key: &str| {
            self.source_attribution
                .get(key)
                .cloned()
                .unwrap_or(ConfigSource::Defaults)
                .to_string()
        };

        for stage in [
            Stage::Creator,
            Stage::Qa,
            Stage::Questioner,
            Stage::Analyzer,
            Stage::Suggestions,
        ] {
            let key = if self.stages.get(stage).and_then(|s| s.model.as_ref()).is_some() {
                "stages"
            } else {
                "model"
            };
            config.insert(
                format!("model.{stage}"),
                (self.model_for_stage(stage), source_of(key)),
            );
        }

        config.insert(
            "stage_timeout".to_string(),
            (
                format!("{}s", self.stage_timeout().as_secs()),
                source_of("stage_timeout"),
            ),
        );
        config.insert(
            "verbose".to_string(),
            (self.verbose().to_string(), source_of("verbose")),
        );
        config.insert(
            "llm_provider".to_string(),
            (self.provider().to_string(), source_of("llm_provider")),
        );
        if let Some(budget) = self.llm.budget {
            config.insert(
                "llm_budget".to_string(),
                (budget.to_string(), source_of("llm_budget")),
            );
        }

        config
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// Create a minimal Config for testing purposes
    ///
    /// Built-in defaults only; no discovery, no environment.
    pub fn minimal_for_testing() -> Self {
        Config {
            defaults: Defaults::default(),
            llm: LlmConfig {
                provider: Some(DEFAULT_PROVIDER.to_string()),
                budget: None,
                gemini: None,
            },
            stages: StagesConfig::default(),
            source_attribution: std::collections::HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests;
