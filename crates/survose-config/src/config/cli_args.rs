use std::path::PathBuf;

/// Configuration overrides coming from the command line.
///
/// Every field is optional; `None` leaves lower-precedence layers in charge.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file (skips upward discovery)
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub llm_provider: Option<String>,
    /// Per-call timeout in seconds
    pub stage_timeout: Option<u64>,
    pub verbose: Option<bool>,
}
