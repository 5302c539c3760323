//! QA reports: six categories of findings about a survey.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;
use tracing::warn;

use crate::value::scalar_to_string;

/// One QA finding category. Iteration order is the report order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum QaCategory {
    Bias,
    Demographics,
    LeadingQuestions,
    Clarity,
    LengthAndFatigue,
    SensitivityAndEthics,
}

impl QaCategory {
    /// JSON key, e.g. `leadingQuestions`.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.into()
    }

    /// Heading for human-readable output.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bias => "Bias",
            Self::Demographics => "Demographics",
            Self::LeadingQuestions => "Leading questions",
            Self::Clarity => "Clarity",
            Self::LengthAndFatigue => "Length & fatigue",
            Self::SensitivityAndEthics => "Sensitivity & ethics",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::iter().find(|c| c.key() == key)
    }
}

/// Findings per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaSections {
    pub bias: Vec<String>,
    pub demographics: Vec<String>,
    pub leading_questions: Vec<String>,
    pub clarity: Vec<String>,
    pub length_and_fatigue: Vec<String>,
    pub sensitivity_and_ethics: Vec<String>,
}

impl QaSections {
    #[must_use]
    pub fn get(&self, category: QaCategory) -> &[String] {
        match category {
            QaCategory::Bias => &self.bias,
            QaCategory::Demographics => &self.demographics,
            QaCategory::LeadingQuestions => &self.leading_questions,
            QaCategory::Clarity => &self.clarity,
            QaCategory::LengthAndFatigue => &self.length_and_fatigue,
            QaCategory::SensitivityAndEthics => &self.sensitivity_and_ethics,
        }
    }

    fn slot(&mut self, category: QaCategory) -> &mut Vec<String> {
        match category {
            QaCategory::Bias => &mut self.bias,
            QaCategory::Demographics => &mut self.demographics,
            QaCategory::LeadingQuestions => &mut self.leading_questions,
            QaCategory::Clarity => &mut self.clarity,
            QaCategory::LengthAndFatigue => &mut self.length_and_fatigue,
            QaCategory::SensitivityAndEthics => &mut self.sensitivity_and_ethics,
        }
    }

    /// Categories in report order with their findings.
    pub fn iter(&self) -> impl Iterator<Item = (QaCategory, &[String])> {
        QaCategory::iter().map(move |c| (c, self.get(c)))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportShapeError {
    #[error("expected a JSON object with QA sections")]
    NotAnObject,
}

/// Result of a QA run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<String>,
    pub run_at: DateTime<Utc>,
    pub sections: QaSections,
}

impl QaReport {
    /// Coerce a model response into a report.
    ///
    /// Per category: an array keeps its scalar entries as strings, a bare
    /// string becomes a one-item list, anything else (or a missing key) an
    /// empty list. Empty sections are accepted and logged.
    pub fn from_value(value: &Value) -> Result<Self, ReportShapeError> {
        let object = value.as_object().ok_or(ReportShapeError::NotAnObject)?;
        let mut sections = QaSections::default();

        for category in QaCategory::iter() {
            let findings: Vec<String> = match object.get(category.key()) {
                Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
                Some(Value::String(s)) => vec![s.clone()],
                _ => Vec::new(),
            };
            if findings.is_empty() {
                warn!(category = category.key(), "QA response has no findings for category");
            }
            *sections.slot(category) = findings;
        }

        Ok(Self {
            survey_id: None,
            run_at: Utc::now(),
            sections,
        })
    }

    #[must_use]
    pub fn with_survey_id(mut self, survey_id: impl Into<String>) -> Self {
        self.survey_id = Some(survey_id.into());
        self
    }

    /// Total number of findings across all categories.
    #[must_use]
    pub fn finding_count(&self) -> usize {
        self.sections.iter().map(|(_, items)| items.len()).sum()
    }
}

/// Response schema for the QA call: six required string arrays.
#[must_use]
pub fn qa_response_schema() -> Value {
    let mut properties = serde_json::Map::new();
    for category in QaCategory::iter() {
        properties.insert(
            category.key().to_string(),
            json!({"type": "ARRAY", "items": {"type": "STRING"}}),
        );
    }
    let required: Vec<&str> = QaCategory::iter().map(|c| c.key()).collect();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}
