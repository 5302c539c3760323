//! Survey data model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{EnumIter, IntoStaticStr};
use thiserror::Error;

use crate::normalize::normalize_questions;

/// Title used when the model omits one.
pub const DEFAULT_TITLE: &str = "Untitled Survey";

/// The five question kinds a voice agent can ask.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuestionType {
    #[default]
    OpenEnded,
    Scale,
    MultipleChoice,
    Checkbox,
    YesNo,
}

impl QuestionType {
    /// Wire name, e.g. `multiple_choice`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Exact wire-name lookup.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "open_ended" => Some(Self::OpenEnded),
            "scale" => Some(Self::Scale),
            "multiple_choice" => Some(Self::MultipleChoice),
            "checkbox" => Some(Self::Checkbox),
            "yes_no" => Some(Self::YesNo),
            _ => None,
        }
    }

    /// Tolerant lookup for model output: case, spaces, hyphens and
    /// `yes/no` spellings are accepted.
    #[must_use]
    pub fn parse_lenient(name: &str) -> Option<Self> {
        let canonical: String = name
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' || c == '/' { '_' } else { c })
            .collect();
        match canonical.as_str() {
            "open" | "openended" | "text" => Some(Self::OpenEnded),
            "multiplechoice" | "single_choice" => Some(Self::MultipleChoice),
            "yesno" | "boolean" => Some(Self::YesNo),
            "rating" => Some(Self::Scale),
            other => Self::from_name(other),
        }
    }

    /// How the voice agent announces the type.
    #[must_use]
    pub fn spoken_label(&self) -> &'static str {
        match self {
            Self::OpenEnded => "open-ended",
            Self::Scale => "scale",
            Self::MultipleChoice => "multiple choice",
            Self::Checkbox => "checkbox",
            Self::YesNo => "yes/no",
        }
    }

    /// Types answered by picking from `choices`.
    #[must_use]
    pub fn has_choices(&self) -> bool {
        matches!(self, Self::MultipleChoice | Self::Checkbox | Self::YesNo)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-dependent answer options.
///
/// After normalization exactly one shape is populated: `min`/`max` for
/// scale, `choices` for choice types, nothing for open-ended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionOptions {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::value::serialize_number"
    )]
    pub min: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::value::serialize_number"
    )]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

impl QuestionOptions {
    #[must_use]
    pub fn scale(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            choices: None,
        }
    }

    #[must_use]
    pub fn choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            min: None,
            max: None,
            choices: Some(choices.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.choices.is_none()
    }
}

/// One normalized survey question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: QuestionOptions,
}

/// A question exactly as a model (or user) supplied it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawQuestion {
    /// A bare string: the question text.
    PlainText(String),
    /// An object with any subset of `id`, `text`, `type`, `options`.
    Structured(Map<String, Value>),
}

impl RawQuestion {
    /// Non-string, non-object values become an empty structured question.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::PlainText(text.clone()),
            Value::Object(map) => Self::Structured(map.clone()),
            _ => Self::Structured(Map::new()),
        }
    }
}

impl From<&Question> for RawQuestion {
    fn from(question: &Question) -> Self {
        let mut options = Map::new();
        if let Some(min) = question.options.min {
            options.insert("min".to_string(), Value::from(min));
        }
        if let Some(max) = question.options.max {
            options.insert("max".to_string(), Value::from(max));
        }
        if let Some(choices) = &question.options.choices {
            options.insert(
                "choices".to_string(),
                Value::Array(choices.iter().cloned().map(Value::String).collect()),
            );
        }

        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(question.id.clone()));
        map.insert("text".to_string(), Value::String(question.text.clone()));
        map.insert(
            "type".to_string(),
            Value::String(question.question_type.as_str().to_string()),
        );
        map.insert("options".to_string(), Value::Object(options));
        Self::Structured(map)
    }
}

/// A stage response that cannot be read as a survey.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("missing 'questions'")]
    MissingQuestions,
    #[error("'questions' is not an array")]
    QuestionsNotArray,
    #[error("'questions' is empty")]
    NoQuestions,
}

/// A complete survey: a title and its questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyDraft {
    pub title: String,
    pub questions: Vec<Question>,
}

impl SurveyDraft {
    /// Read a `{title, questions}` object and normalize its questions.
    ///
    /// A missing, non-string or blank title is replaced by `fallback_title`.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use survose_survey::{QuestionType, SurveyDraft};
    ///
    /// let draft = SurveyDraft::from_value(
    ///     &json!({"questions": ["How was your visit?"]}),
    ///     "Untitled Survey",
    /// )
    /// .unwrap();
    /// assert_eq!(draft.title, "Untitled Survey");
    /// assert_eq!(draft.questions[0].id, "q0");
    /// assert_eq!(draft.questions[0].question_type, QuestionType::OpenEnded);
    /// ```
    pub fn from_value(value: &Value, fallback_title: &str) -> Result<Self, DraftError> {
        let object = value.as_object().ok_or(DraftError::NotAnObject)?;
        let questions = object
            .get("questions")
            .ok_or(DraftError::MissingQuestions)?
            .as_array()
            .ok_or(DraftError::QuestionsNotArray)?;
        if questions.is_empty() {
            return Err(DraftError::NoQuestions);
        }

        let title = object
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(fallback_title)
            .to_string();

        let raw: Vec<RawQuestion> = questions.iter().map(RawQuestion::from_value).collect();
        Ok(Self {
            title,
            questions: normalize_questions(&raw),
        })
    }

    /// Run the normalizer again over already typed questions.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let raw: Vec<RawQuestion> = self.questions.iter().map(RawQuestion::from).collect();
        Self {
            title: self.title.clone(),
            questions: normalize_questions(&raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_question_type_names() {
        for qt in QuestionType::iter() {
            assert_eq!(QuestionType::from_name(qt.as_str()), Some(qt));
            assert_eq!(QuestionType::parse_lenient(qt.as_str()), Some(qt));
        }
        assert_eq!(QuestionType::from_name("Scale"), None);
    }

    #[test]
    fn test_lenient_type_parsing() {
        assert_eq!(
            QuestionType::parse_lenient("Multiple Choice"),
            Some(QuestionType::MultipleChoice)
        );
        assert_eq!(QuestionType::parse_lenient("yes/no"), Some(QuestionType::YesNo));
        assert_eq!(QuestionType::parse_lenient("open-ended"), Some(QuestionType::OpenEnded));
        assert_eq!(QuestionType::parse_lenient("ranking"), None);
    }

    #[test]
    fn test_question_serializes_wire_shape() {
        let question = Question {
            id: "q0".to_string(),
            text: "Rate us".to_string(),
            question_type: QuestionType::Scale,
            options: QuestionOptions::scale(1.0, 10.0),
        };

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(
            value,
            json!({"id": "q0", "text": "Rate us", "type": "scale", "options": {"min": 1, "max": 10}})
        );

        let open = Question {
            question_type: QuestionType::OpenEnded,
            options: QuestionOptions::default(),
            ..question
        };
        assert_eq!(serde_json::to_value(&open).unwrap()["options"], json!({}));
    }

    #[test]
    fn test_question_deserializes_without_options() {
        let question: Question =
            serde_json::from_value(json!({"id": "a", "text": "t", "type": "yes_no"})).unwrap();
        assert!(question.options.is_empty());
    }

    #[test]
    fn test_from_value_shape_errors() {
        assert_eq!(
            SurveyDraft::from_value(&json!([]), DEFAULT_TITLE),
            Err(DraftError::NotAnObject)
        );
        assert_eq!(
            SurveyDraft::from_value(&json!({"title": "x"}), DEFAULT_TITLE),
            Err(DraftError::MissingQuestions)
        );
        assert_eq!(
            SurveyDraft::from_value(&json!({"questions": "q"}), DEFAULT_TITLE),
            Err(DraftError::QuestionsNotArray)
        );
        assert_eq!(
            SurveyDraft::from_value(&json!({"questions": []}), DEFAULT_TITLE),
            Err(DraftError::NoQuestions)
        );
    }

    #[test]
    fn test_from_value_title_fallback() {
        let draft = SurveyDraft::from_value(
            &json!({"title": "   ", "questions": ["a"]}),
            "Previous Title",
        )
        .unwrap();
        assert_eq!(draft.title, "Previous Title");

        let draft =
            SurveyDraft::from_value(&json!({"title": " Coffee ", "questions": ["a"]}), "x")
                .unwrap();
        assert_eq!(draft.title, "Coffee");
    }

    #[test]
    fn test_raw_question_from_value() {
        assert_eq!(
            RawQuestion::from_value(&json!("hi")),
            RawQuestion::PlainText("hi".to_string())
        );
        assert_eq!(
            RawQuestion::from_value(&json!(42)),
            RawQuestion::Structured(Map::new())
        );
    }
}
