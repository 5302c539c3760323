//! Response analytics.
//!
//! Summarizes collected responses for one survey: how many came in, how many
//! were completed, and how answers are distributed per question. Response
//! records are untrusted JSON of the form `{completed, answers}`, where
//! `answers` is indexed by question position (an array, or an object keyed by
//! the index as a string).

use serde::Serialize;
use serde_json::Value;

use crate::value::format_number;

/// Label counted when a response has no answer for a question.
pub const SKIPPED_LABEL: &str = "(skipped)";

/// Question text used when the survey has no `questions` at all.
const DEFAULT_QUESTION_TEXT: &str = "Default question";

/// One answer value and how often it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCount {
    pub label: String,
    pub count: usize,
    /// Share of all responses, rounded to a whole percent
    pub pct: u32,
}

/// Answer distribution for one question, labels in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDistribution {
    pub question: String,
    pub entries: Vec<AnswerCount>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub response_count: usize,
    pub completed_count: usize,
    /// Completed share of all responses, rounded to a whole percent
    pub completion_rate: u32,
    pub distributions: Vec<QuestionDistribution>,
}

/// The response records in a payload: a bare array or `{responses: [...]}`.
#[must_use]
pub fn response_records(payload: &Value) -> Option<&[Value]> {
    match payload {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(map) => map
            .get("responses")
            .and_then(Value::as_array)
            .map(Vec::as_slice),
        _ => None,
    }
}

/// Summarize `responses` against the questions of `survey`.
///
/// A survey without a `questions` array is treated as having one default
/// question; an empty array yields no distributions.
///
/// ```rust
/// use serde_json::json;
/// use survose_survey::summarize_responses;
///
/// let survey = json!({"questions": [{"text": "Enjoyed it?", "type": "yes_no"}]});
/// let responses = [
///     json!({"completed": true, "answers": ["Yes"]}),
///     json!({"completed": false, "answers": []}),
/// ];
/// let summary = summarize_responses(&survey, &responses);
/// assert_eq!(summary.completion_rate, 50);
/// assert_eq!(summary.distributions[0].entries[1].label, "(skipped)");
/// ```
#[must_use]
pub fn summarize_responses(survey: &Value, responses: &[Value]) -> ResponseSummary {
    let total = responses.len();
    let completed_count = responses
        .iter()
        .filter(|r| r.get("completed").is_some_and(is_truthy))
        .count();

    let question_texts: Vec<String> = match survey.get("questions").and_then(Value::as_array) {
        Some(questions) => questions.iter().map(question_text).collect(),
        None => vec![DEFAULT_QUESTION_TEXT.to_string()],
    };

    let distributions = question_texts
        .into_iter()
        .enumerate()
        .map(|(index, question)| {
            let mut counts: Vec<(String, usize)> = Vec::new();
            for response in responses {
                let label = answer_at(response, index)
                    .map_or_else(|| SKIPPED_LABEL.to_string(), answer_label);
                match counts.iter_mut().find(|(seen, _)| *seen == label) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((label, 1)),
                }
            }

            QuestionDistribution {
                question,
                entries: counts
                    .into_iter()
                    .map(|(label, count)| AnswerCount {
                        label,
                        count,
                        pct: percent(count, total),
                    })
                    .collect(),
                total,
            }
        })
        .collect();

    ResponseSummary {
        response_count: total,
        completed_count,
        completion_rate: percent(completed_count, total),
        distributions,
    }
}

/// `part / whole` as a percent, half rounded up; 0 when `whole` is 0.
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let rounded = (part * 200 + whole) / (whole * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

fn question_text(question: &Value) -> String {
    match question {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("text") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

fn answer_at(response: &Value, index: usize) -> Option<&Value> {
    let answer = match response.get("answers")? {
        Value::Array(items) => items.get(index),
        Value::Object(map) => map.get(&index.to_string()),
        _ => None,
    };
    answer.filter(|a| !a.is_null())
}

fn answer_label(answer: &Value) -> String {
    match answer {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(u)) => u.to_string(),
            _ => n.as_f64().map_or_else(|| n.to_string(), format_number),
        },
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}
