//! Configuration for survose: model, discovery, precedence, and validation.

pub mod config;

pub use config::{
    CliArgs, Config, ConfigBuilder, DEFAULT_MODEL, DEFAULT_PROVIDER, DEFAULT_STAGE_TIMEOUT_SECS,
    Defaults, GeminiConfig, LlmConfig, SUPPORTED_PROVIDERS, StageConfig, StagesConfig,
};
pub use survose_utils::types::ConfigSource;
