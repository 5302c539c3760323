//! Voice script builder.
//!
//! Turns user-authored survey JSON into the text a phone agent reads aloud
//! plus a structured copy of the questions keyed by survey title. Input is
//! untrusted: invalid questions are skipped with a reason, and only a survey
//! with no usable question is an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use survose_utils::error::ScriptError;

use crate::model::{DEFAULT_TITLE, QuestionType};
use crate::normalize::MIN_CHOICES;
use crate::value::{format_number, parse_number, scalar_to_string};

/// Type-specific answer details for one scripted question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptDetails {
    Options(Vec<String>),
    Range { min: String, max: String },
}

/// Structured form of one scripted question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptEntry {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ScriptDetails>,
}

/// Spoken text plus structured entry for one valid question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBlock {
    pub spoken: String,
    pub entry: ScriptEntry,
}

/// Why a question was left out of the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NotAnObject,
    EmptyText,
    UnknownType { found: String },
    TooFewChoices { found: usize },
    InvalidRange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "question is not an object"),
            Self::EmptyText => write!(f, "question text is empty"),
            Self::UnknownType { found } => write!(f, "unknown question type '{found}'"),
            Self::TooFewChoices { found } => {
                write!(f, "needs at least {MIN_CHOICES} non-empty choices, found {found}")
            }
            Self::InvalidRange => write!(f, "scale range requires numeric min < max"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedQuestion {
    pub index: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// The assembled script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceScript {
    pub title: String,
    /// Question blocks separated by blank lines.
    pub prompt: String,
    /// `{title: [entries]}`
    pub question_json: BTreeMap<String, Vec<ScriptEntry>>,
    pub skipped: Vec<SkippedQuestion>,
}

/// Render one question, or say why it cannot be asked.
///
/// ```rust
/// use serde_json::json;
/// use survose_survey::build_question_block;
///
/// let block = build_question_block(&json!({
///     "text": "Rate the service",
///     "type": "scale",
///     "options": {"min": 1, "max": "5"}
/// }))
/// .unwrap();
/// assert_eq!(block.spoken, "This is a scale question.\nRate the service\nRange: 1 to 5");
/// ```
pub fn build_question_block(question: &Value) -> Result<QuestionBlock, SkipReason> {
    let object = question.as_object().ok_or(SkipReason::NotAnObject)?;

    let text = object
        .get("text")
        .and_then(scalar_to_string)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(SkipReason::EmptyText);
    }

    let question_type = match object.get("type") {
        Some(Value::String(name)) => {
            QuestionType::from_name(name).ok_or_else(|| SkipReason::UnknownType {
                found: name.clone(),
            })?
        }
        Some(other) => {
            return Err(SkipReason::UnknownType {
                found: other.to_string(),
            });
        }
        None => {
            return Err(SkipReason::UnknownType {
                found: "<missing>".to_string(),
            });
        }
    };

    let mut lines = vec![
        format!("This is a {} question.", question_type.spoken_label()),
        text.clone(),
    ];
    let options = object.get("options").filter(|o| o.is_object());

    let details = match question_type {
        QuestionType::MultipleChoice | QuestionType::Checkbox | QuestionType::YesNo => {
            let choices: Vec<String> = options
                .and_then(|o| o.get("choices"))
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(scalar_to_string)
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            if choices.len() < MIN_CHOICES {
                return Err(SkipReason::TooFewChoices {
                    found: choices.len(),
                });
            }
            lines.push(format!("Options: {}", choices.join(", ")));
            Some(ScriptDetails::Options(choices))
        }
        QuestionType::Scale => {
            let bound = |key: &str| options.and_then(|o| o.get(key)).and_then(parse_number);
            let (min, max) = match (bound("min"), bound("max")) {
                (Some(min), Some(max)) if min < max => (format_number(min), format_number(max)),
                _ => return Err(SkipReason::InvalidRange),
            };
            lines.push(format!("Range: {min} to {max}"));
            Some(ScriptDetails::Range { min, max })
        }
        QuestionType::OpenEnded => None,
    };

    Ok(QuestionBlock {
        spoken: lines.join("\n"),
        entry: ScriptEntry {
            question: text,
            question_type,
            details,
        },
    })
}

/// Build the full script from a title and a `questions` value.
///
/// # Errors
///
/// [`ScriptError::QuestionsNotArray`] when `questions` is not an array,
/// [`ScriptError::NoValidQuestions`] when every question was skipped.
pub fn build_voice_script(title: Option<&str>, questions: &Value) -> Result<VoiceScript, ScriptError> {
    let items = questions.as_array().ok_or(ScriptError::QuestionsNotArray)?;

    let mut blocks = Vec::new();
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (index, question) in items.iter().enumerate() {
        match build_question_block(question) {
            Ok(block) => {
                blocks.push(block.spoken);
                entries.push(block.entry);
            }
            Err(reason) => {
                tracing::debug!(index, %reason, "Skipping question in voice script");
                skipped.push(SkippedQuestion { index, reason });
            }
        }
    }

    if blocks.is_empty() {
        return Err(ScriptError::NoValidQuestions {
            skipped: skipped.len(),
        });
    }

    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    let mut question_json = BTreeMap::new();
    question_json.insert(title.clone(), entries);

    Ok(VoiceScript {
        title,
        prompt: blocks.join("\n\n"),
        question_json,
        skipped,
    })
}

/// Build the script from a `{title, questions}` payload.
///
/// A missing `questions` key counts as an empty list.
pub fn build_voice_script_from_payload(payload: &Value) -> Result<VoiceScript, ScriptError> {
    let empty = Value::Array(Vec::new());
    let title = payload.get("title").and_then(Value::as_str);
    let questions = payload.get("questions").unwrap_or(&empty);
    build_voice_script(title, questions)
}
