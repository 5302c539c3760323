//! Shared I/O helpers for CLI commands
//!
//! Survey files are untrusted user input: read failures stay IO errors, but
//! anything unparsable is reported as `InvalidSurvey` (exit code 3).

use anyhow::Result;
use serde_json::Value;
use std::io::{Read, Write};
use std::path::Path;

use crate::SurvoseError;
use survose_survey::{DEFAULT_TITLE, SurveyDraft};

/// File argument that means "read stdin".
pub const STDIN_MARKER: &str = "-";

/// Human-readable name of an input path for error messages.
#[must_use]
pub fn source_name(path: &Path) -> String {
    if is_stdin(path) {
        "stdin".to_string()
    } else {
        path.display().to_string()
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_MARKER
}

/// Read a file argument, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<String, SurvoseError> {
    if is_stdin(path) {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Parse survey file contents as JSON.
pub fn parse_survey_json(source_name: &str, contents: &str) -> Result<Value, SurvoseError> {
    serde_json::from_str(contents).map_err(|e| SurvoseError::InvalidSurvey {
        source_name: source_name.to_string(),
        reason: format!("not valid JSON: {e}"),
    })
}

/// Read and parse a survey file in one go.
pub fn load_survey_value(path: &Path) -> Result<Value, SurvoseError> {
    let contents = read_input(path)?;
    parse_survey_json(&source_name(path), &contents)
}

/// Read a `{title, questions}` value into a normalized draft.
pub fn draft_from_value(source_name: &str, value: &Value) -> Result<SurveyDraft, SurvoseError> {
    SurveyDraft::from_value(value, DEFAULT_TITLE).map_err(|e| SurvoseError::InvalidSurvey {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })
}

/// Survey id for review caching and reports: `--id`, then the JSON `id`
/// field (string or number), then the file stem, then `stdin`.
#[must_use]
pub fn resolve_survey_id(explicit: Option<&str>, value: &Value, path: &Path) -> String {
    if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    match value.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
        Some(Value::Number(n)) => return n.to_string(),
        _ => {}
    }

    if is_stdin(path) {
        return "stdin".to_string();
    }

    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "survey".to_string())
}

/// Write command output to `--out` or stdout, always newline-terminated.
pub fn emit(out: Option<&Path>, text: &str) -> Result<()> {
    let mut text = text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    match out {
        Some(path) => {
            std::fs::write(path, text).map_err(SurvoseError::from)?;
            tracing::info!(path = %path.display(), "Wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes()).map_err(SurvoseError::from)?;
            stdout.flush().map_err(SurvoseError::from)?;
        }
    }
    Ok(())
}

/// Pretty JSON for command output.
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
