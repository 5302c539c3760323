//! `survose script` and `survose normalize`

use anyhow::Result;
use serde_json::{Value, json};
use std::path::Path;

use super::common::{draft_from_value, emit, load_survey_value, source_name, to_pretty_json};
use crate::VoiceScript;
use survose_survey::build_voice_script_from_payload;
use survose_utils::error::SurvoseError;

/// Structured form of a script: title, spoken prompt, question JSON, skips.
#[must_use]
pub fn render_script_json(script: &VoiceScript) -> Value {
    json!({
        "title": script.title,
        "prompt": script.prompt,
        "questionJson": script.question_json,
        "skipped": script.skipped,
    })
}

/// Execute the script command
pub fn execute_script_command(file: &Path, json: bool, out: Option<&Path>) -> Result<()> {
    let value = load_survey_value(file)?;
    let script = build_voice_script_from_payload(&value).map_err(SurvoseError::from)?;

    if json {
        return emit(out, &to_pretty_json(&render_script_json(&script))?);
    }

    for skipped in &script.skipped {
        eprintln!("⚠ Skipped question {}: {}", skipped.index, skipped.reason);
    }
    emit(out, &script.prompt)
}

/// Execute the normalize command
pub fn execute_normalize_command(file: &Path, out: Option<&Path>) -> Result<()> {
    let value = load_survey_value(file)?;
    let draft = draft_from_value(&source_name(file), &value)?;
    emit(out, &to_pretty_json(&draft)?)
}
