use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use survose_utils::types::ConfigSource;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default per-call timeout in seconds.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 120;

/// Default provider name.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Providers the backend factory can build.
pub const SUPPORTED_PROVIDERS: &[&str] = &["gemini"];

/// Configuration for survose.
///
/// Precedence: CLI arguments > environment > config file > built-in defaults.
///
/// Use [`Config::discover()`] for CLI-like behavior (searches upward for
/// `.survose/config.toml`), or [`Config::builder()`] when embedding and a
/// deterministic configuration is needed.
#[derive(Debug, Clone)]
pub struct Config {
    /// `[defaults]` section
    pub defaults: Defaults,
    /// `[llm]` section
    pub llm: LlmConfig,
    /// `[stages.<stage>]` overrides
    pub stages: StagesConfig,
    /// Where each effective value came from, keyed by setting name
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[defaults]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Model for every stage without its own override
    pub model: Option<String>,
    /// Per-call timeout in seconds
    pub stage_timeout: Option<u64>,
    pub verbose: Option<bool>,
}

/// `[llm]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    pub provider: Option<String>,
    /// Maximum model calls per process
    pub budget: Option<u32>,
    pub gemini: Option<GeminiConfig>,
}

/// `[llm.gemini]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Environment variable holding the API key (default `GEMINI_API_KEY`)
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    /// Provider-level default model
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// `[stages.<stage>]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub model: Option<String>,
}

/// `[stages]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StagesConfig {
    pub creator: Option<StageConfig>,
    pub qa: Option<StageConfig>,
    pub questioner: Option<StageConfig>,
    pub analyzer: Option<StageConfig>,
    pub suggestions: Option<StageConfig>,
}

impl StagesConfig {
    /// Stage override, if one is configured.
    #[must_use]
    pub fn get(&self, stage: survose_utils::Stage) -> Option<&StageConfig> {
        use survose_utils::Stage;

        match stage {
            Stage::Creator => self.creator.as_ref(),
            Stage::Qa => self.qa.as_ref(),
            Stage::Questioner => self.questioner.as_ref(),
            Stage::Analyzer => self.analyzer.as_ref(),
            Stage::Suggestions => self.suggestions.as_ref(),
        }
    }
}
