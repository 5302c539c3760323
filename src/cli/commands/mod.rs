//! CLI command implementations (facade).
//!
//! Handlers return `anyhow::Result`; domain failures are `SurvoseError`s that
//! `run.rs` downcasts for reporting and exit codes.

// Helpers are re-exported for the CLI tests even where run.rs does not use them.
#![allow(unused_imports)]

mod analyze;
mod common;
mod generate;
mod review;
mod script;

pub use analyze::{execute_analyze_command, render_summary_text};
pub use common::{
    draft_from_value, emit, load_survey_value, parse_survey_json, read_input, resolve_survey_id,
    source_name,
};
pub use generate::{execute_generate_command, resolve_prompt};
pub use review::{
    execute_qa_command, execute_suggest_command, render_report_text, render_suggestions_text,
};
pub use script::{execute_normalize_command, execute_script_command, render_script_json};
