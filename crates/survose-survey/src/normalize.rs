//! Repair model-produced questions into the strict [`Question`] shape.
//!
//! Rules, applied per question:
//! - missing or duplicate ids become `q<index>`
//! - missing or unknown types become `open_ended`
//! - scale options become `{min: 1, max: 10}` unless both bounds are numeric with `min < max`
//! - choice lists hold at least two strings
//! - yes/no questions always carry `["Yes", "No"]`
//!
//! Normalizing an already normalized survey changes nothing.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::model::{Question, QuestionOptions, QuestionType, RawQuestion};
use crate::value::{parse_number, scalar_to_string};

pub const DEFAULT_SCALE_MIN: f64 = 1.0;
pub const DEFAULT_SCALE_MAX: f64 = 10.0;
pub const MIN_CHOICES: usize = 2;

/// Normalize a list of raw questions, assigning unique ids.
#[must_use]
pub fn normalize_questions(raw: &[RawQuestion]) -> Vec<Question> {
    let mut seen = HashSet::new();

    raw.iter()
        .enumerate()
        .map(|(idx, question)| {
            let mut normalized = normalize_question(idx, question);
            normalized.id = unique_id(normalized.id, idx, &mut seen);
            normalized
        })
        .collect()
}

fn unique_id(candidate: String, idx: usize, seen: &mut HashSet<String>) -> String {
    if seen.insert(candidate.clone()) {
        return candidate;
    }

    let positional = format!("q{idx}");
    if seen.insert(positional.clone()) {
        return positional;
    }

    let mut suffix = 1;
    loop {
        let id = format!("q{idx}_{suffix}");
        if seen.insert(id.clone()) {
            return id;
        }
        suffix += 1;
    }
}

fn normalize_question(idx: usize, raw: &RawQuestion) -> Question {
    match raw {
        RawQuestion::PlainText(text) => Question {
            id: format!("q{idx}"),
            text: text.trim().to_string(),
            question_type: QuestionType::OpenEnded,
            options: QuestionOptions::default(),
        },
        RawQuestion::Structured(map) => {
            let question_type = map
                .get("type")
                .and_then(Value::as_str)
                .and_then(QuestionType::parse_lenient)
                .unwrap_or_default();

            Question {
                id: read_id(map).unwrap_or_else(|| format!("q{idx}")),
                text: read_text(map),
                question_type,
                options: repair_options(question_type, map.get("options")),
            }
        }
    }
}

fn read_id(map: &Map<String, Value>) -> Option<String> {
    let id = scalar_to_string(map.get("id")?)?;
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

fn read_text(map: &Map<String, Value>) -> String {
    ["text", "question"]
        .iter()
        .find_map(|key| map.get(*key).and_then(scalar_to_string))
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn repair_options(question_type: QuestionType, options: Option<&Value>) -> QuestionOptions {
    match question_type {
        QuestionType::OpenEnded => QuestionOptions::default(),
        QuestionType::YesNo => QuestionOptions::choices(["Yes", "No"]),
        QuestionType::Scale => {
            let bound = |key: &str| options.and_then(|o| o.get(key)).and_then(parse_number);
            match (bound("min"), bound("max")) {
                (Some(min), Some(max)) if min < max => QuestionOptions::scale(min, max),
                _ => QuestionOptions::scale(DEFAULT_SCALE_MIN, DEFAULT_SCALE_MAX),
            }
        }
        QuestionType::MultipleChoice | QuestionType::Checkbox => {
            // a bare array in `options` is read as the choice list
            let source = match options {
                Some(Value::Array(_)) => options,
                Some(Value::Object(map)) => map.get("choices"),
                _ => None,
            };
            let mut choices: Vec<String> = match source {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(scalar_to_string)
                    .map(|choice| choice.trim().to_string())
                    .filter(|choice| !choice.is_empty())
                    .collect(),
                Some(other) => scalar_to_string(other)
                    .map(|choice| choice.trim().to_string())
                    .filter(|choice| !choice.is_empty())
                    .into_iter()
                    .collect(),
                None => Vec::new(),
            };
            while choices.len() < MIN_CHOICES {
                choices.push(String::new());
            }
            QuestionOptions::choices(choices)
        }
    }
}
