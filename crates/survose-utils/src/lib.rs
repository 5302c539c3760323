//! Foundation utilities shared by every survose crate.
//!
//! - [`error`]: error taxonomy with user-friendly reporting
//! - [`exit_codes`]: CLI exit code table
//! - [`logging`]: tracing initialization and stage log helpers
//! - [`redaction`]: secret scrubbing for anything that reaches logs or users
//! - [`types`]: pipeline stage names and config source attribution

pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod redaction;
pub mod types;

pub use error::{
    ConfigError, ErrorCategory, GenerationError, LlmError, ScriptError, SurvoseError,
    UserFriendlyError,
};
pub use exit_codes::ExitCode;
pub use types::{ConfigSource, Stage};
