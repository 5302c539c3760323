//! `survose analyze`

use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

use super::common::{emit, load_survey_value, source_name, to_pretty_json};
use survose_survey::{DEFAULT_TITLE, ResponseSummary, response_records, summarize_responses};
use survose_utils::error::SurvoseError;

/// Plain-text summary: totals first, then one block per question.
#[must_use]
pub fn render_summary_text(title: &str, summary: &ResponseSummary) -> String {
    let mut text = format!("Response summary for {title}\n");
    let _ = writeln!(
        text,
        "Responses: {} ({} completed, {}% completion rate)",
        summary.response_count, summary.completed_count, summary.completion_rate
    );

    for (i, distribution) in summary.distributions.iter().enumerate() {
        let _ = write!(
            text,
            "\n{}. {} ({} responses)\n",
            i + 1,
            distribution.question,
            distribution.total
        );
        if distribution.entries.is_empty() {
            text.push_str("   (no responses)\n");
        }
        for entry in &distribution.entries {
            let _ = writeln!(text, "   {}: {} ({}%)", entry.label, entry.count, entry.pct);
        }
    }
    text
}

/// Execute the analyze command
pub fn execute_analyze_command(
    survey_file: &Path,
    responses_file: &Path,
    json: bool,
    out: Option<&Path>,
) -> Result<()> {
    let survey = load_survey_value(survey_file)?;
    let payload = load_survey_value(responses_file)?;
    let records = response_records(&payload).ok_or_else(|| SurvoseError::InvalidSurvey {
        source_name: source_name(responses_file),
        reason: "expected an array of responses or an object with a 'responses' array"
            .to_string(),
    })?;

    let summary = summarize_responses(&survey, records);
    tracing::debug!(
        responses = summary.response_count,
        questions = summary.distributions.len(),
        "Summarized responses"
    );

    if json {
        return emit(out, &to_pretty_json(&summary)?);
    }

    let title = survey
        .get("title")
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);
    emit(out, &render_summary_text(title, &summary))
}
