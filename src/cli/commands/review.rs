//! `survose qa` and `survose suggest`

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use super::common::{
    draft_from_value, emit, load_survey_value, resolve_survey_id, source_name, to_pretty_json,
};
use crate::{Config, PipelineSettings, ReviewCache, Suggestion, SurveyGenerator, SurvoseError};
use survose_survey::QaReport;

fn build_generator(config: &Config) -> Result<SurveyGenerator> {
    let backend = survose_llm::from_config(config).map_err(SurvoseError::from)?;
    Ok(SurveyGenerator::with_settings(
        Arc::from(backend),
        PipelineSettings::from_config(config),
    ))
}

/// Text form of a QA report: one heading per category, findings indented.
#[must_use]
pub fn render_report_text(survey_id: &str, report: &QaReport) -> String {
    let mut out = format!(
        "QA report for {survey_id} ({} findings)\n",
        report.finding_count()
    );
    for (category, findings) in report.sections.iter() {
        out.push_str(&format!("\n{}:\n", category.label()));
        if findings.is_empty() {
            out.push_str("  (none)\n");
        }
        for finding in findings {
            out.push_str(&format!("  - {finding}\n"));
        }
    }
    out
}

/// Text form of suggestions as a numbered list.
#[must_use]
pub fn render_suggestions_text(survey_id: &str, suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return format!("No suggestions for {survey_id}\n");
    }

    let mut out = format!("Suggestions for {survey_id}:\n");
    for (i, s) in suggestions.iter().enumerate() {
        out.push_str(&format!("{}. ", i + 1));
        if let Some(category) = s.category {
            out.push_str(&format!("[{}] ", category.label()));
        }
        if let Some(question_id) = &s.question_id {
            out.push_str(&format!("({question_id}) "));
        }
        out.push_str(&s.suggestion);
        out.push('\n');
    }
    out
}

/// Execute the qa command
pub async fn execute_qa_command(
    file: &Path,
    id: Option<&str>,
    json: bool,
    out: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let value = load_survey_value(file)?;
    let draft = draft_from_value(&source_name(file), &value)?;
    let survey_id = resolve_survey_id(id, &value, file);

    let generator = build_generator(config)?;
    let mut cache = ReviewCache::new();
    let report = generator.review_survey(&survey_id, &draft, &mut cache).await?;

    let text = if json {
        to_pretty_json(&report)?
    } else {
        render_report_text(&survey_id, &report)
    };
    emit(out, &text)
}

/// Execute the suggest command
pub async fn execute_suggest_command(
    file: &Path,
    id: Option<&str>,
    json: bool,
    out: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let value = load_survey_value(file)?;
    let draft = draft_from_value(&source_name(file), &value)?;
    let survey_id = resolve_survey_id(id, &value, file);

    let generator = build_generator(config)?;
    let mut cache = ReviewCache::new();
    let suggestions = generator
        .suggest_improvements(&survey_id, &draft, &mut cache)
        .await?;

    let text = if json {
        to_pretty_json(&serde_json::json!({
            "surveyId": survey_id,
            "suggestions": suggestions,
        }))?
    } else {
        render_suggestions_text(&survey_id, &suggestions)
    };
    emit(out, &text)
}
