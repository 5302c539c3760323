//! Plain-text renderings of surveys and reports for model prompts.

use crate::model::{Question, SurveyDraft};
use crate::report::QaReport;

fn title_or_untitled(draft: &SurveyDraft) -> &str {
    if draft.title.trim().is_empty() {
        "Untitled"
    } else {
        &draft.title
    }
}

fn options_json(question: &Question) -> String {
    serde_json::to_string(&question.options).unwrap_or_else(|_| "{}".to_string())
}

/// Survey as seen by the questioner and analyzer.
///
/// ```text
/// Title: Coffee Shop
///
/// Questions:
/// Q1: How was it? [type: open_ended, options: {}]
/// ```
#[must_use]
pub fn format_survey_for_prompt(draft: &SurveyDraft) -> String {
    let lines: Vec<String> = draft
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            format!(
                "Q{}: {} [type: {}, options: {}]",
                i + 1,
                q.text,
                q.question_type,
                options_json(q)
            )
        })
        .collect();

    format!(
        "Title: {}\n\nQuestions:\n{}",
        title_or_untitled(draft),
        lines.join("\n")
    )
}

/// Survey as seen by the QA stage. Options are omitted when empty.
#[must_use]
pub fn format_survey_for_qa(draft: &SurveyDraft) -> String {
    let lines: Vec<String> = draft
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let mut line = format!("Q{}: {} [{}]", i + 1, q.text, q.question_type);
            if !q.options.is_empty() {
                line.push_str(" Options: ");
                line.push_str(&options_json(q));
            }
            line
        })
        .collect();

    format!(
        "Survey title: {}\n\nQuestions:\n{}",
        title_or_untitled(draft),
        lines.join("\n")
    )
}

/// Report as bullet lists under each category key.
#[must_use]
pub fn format_report_for_prompt(report: &QaReport) -> String {
    report
        .sections
        .iter()
        .map(|(category, findings)| {
            let bullets: Vec<String> = findings.iter().map(|f| format!("- {f}")).collect();
            format!("{}:\n{}", category.key(), bullets.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
