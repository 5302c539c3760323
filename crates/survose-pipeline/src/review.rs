//! Survey review: QA reports and improvement suggestions for existing surveys.
//!
//! Results are kept in a [`ReviewCache`] owned by the caller, keyed by survey
//! id. The generator itself stays stateless.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use survose_survey::{QaCategory, QaReport, SurveyDraft, extract_json};
use survose_utils::error::{GenerationError, SurvoseError};
use tracing::{debug, info_span, Instrument};

use crate::generator::{SurveyGenerator, new_request_id};

/// One concrete change proposed for a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<QaCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub suggestion: String,
}

impl Suggestion {
    #[must_use]
    pub fn new(suggestion: impl Into<String>) -> Self {
        Self {
            category: None,
            question_id: None,
            suggestion: suggestion.into(),
        }
    }
}

/// Reports and suggestions per survey id.
#[derive(Debug, Clone, Default)]
pub struct ReviewCache {
    reports: HashMap<String, QaReport>,
    suggestions: HashMap<String, Vec<Suggestion>>,
}

impl ReviewCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn report(&self, survey_id: &str) -> Option<&QaReport> {
        self.reports.get(survey_id)
    }

    #[must_use]
    pub fn suggestions(&self, survey_id: &str) -> Option<&[Suggestion]> {
        self.suggestions.get(survey_id).map(Vec::as_slice)
    }

    /// Drop the report and suggestions of one survey (e.g. after it was edited).
    pub fn invalidate(&mut self, survey_id: &str) {
        self.reports.remove(survey_id);
        self.suggestions.remove(survey_id);
    }

    pub fn clear(&mut self) {
        self.reports.clear();
        self.suggestions.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty() && self.suggestions.is_empty()
    }
}

impl SurveyGenerator {
    /// QA report for a survey, from the cache when present.
    ///
    /// # Errors
    ///
    /// See [`SurveyGenerator::run_qa`]. Failures are not cached.
    pub async fn review_survey(
        &self,
        survey_id: &str,
        draft: &SurveyDraft,
        cache: &mut ReviewCache,
    ) -> Result<QaReport, SurvoseError> {
        if let Some(report) = cache.report(survey_id) {
            debug!(survey_id, "Using cached QA report");
            return Ok(report.clone());
        }

        let request_id = new_request_id("review");
        let report = self
            .run_qa(&request_id, draft)
            .instrument(info_span!("review", request_id = %request_id, survey_id))
            .await?
            .with_survey_id(survey_id);

        cache.reports.insert(survey_id.to_string(), report.clone());
        Ok(report)
    }

    /// Suggestions addressing the survey's QA report, from the cache when
    /// present. Builds (and caches) the report first if needed.
    ///
    /// # Errors
    ///
    /// See [`SurveyGenerator::review_survey`] and
    /// [`SurveyGenerator::run_suggestions`].
    pub async fn suggest_improvements(
        &self,
        survey_id: &str,
        draft: &SurveyDraft,
        cache: &mut ReviewCache,
    ) -> Result<Vec<Suggestion>, SurvoseError> {
        if let Some(suggestions) = cache.suggestions(survey_id) {
            debug!(survey_id, "Using cached suggestions");
            return Ok(suggestions.to_vec());
        }

        let report = self.review_survey(survey_id, draft, cache).await?;

        let request_id = new_request_id("suggest");
        let suggestions = self
            .run_suggestions(&request_id, draft, &report)
            .instrument(info_span!("suggest", request_id = %request_id, survey_id))
            .await?;

        cache
            .suggestions
            .insert(survey_id.to_string(), suggestions.clone());
        Ok(suggestions)
    }
}

/// Read a suggestions answer: a JSON array, or an object with a
/// `suggestions` array. Entries may be strings or objects; blank ones are
/// dropped.
pub(crate) fn parse_suggestions(stage: &str, text: &str) -> Result<Vec<Suggestion>, GenerationError> {
    let value = extract_json(text).map_err(|e| GenerationError::InvalidJson {
        stage: stage.to_string(),
        reason: e.to_string(),
    })?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("suggestions") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(GenerationError::UnexpectedShape {
                    stage: stage.to_string(),
                    expected: "'suggestions' to be an array".to_string(),
                });
            }
            None => {
                return Err(GenerationError::MissingField {
                    stage: stage.to_string(),
                    field: "suggestions".to_string(),
                });
            }
        },
        _ => {
            return Err(GenerationError::UnexpectedShape {
                stage: stage.to_string(),
                expected: "a JSON array of suggestions".to_string(),
            });
        }
    };

    Ok(items.iter().filter_map(suggestion_from_value).collect())
}

fn suggestion_from_value(value: &Value) -> Option<Suggestion> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| Suggestion::new(text))
        }
        Value::Object(map) => {
            let text = ["suggestion", "text"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .filter(|t| !t.is_empty())?;

            let question_id = match map.get("questionId") {
                Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };

            Some(Suggestion {
                category: map
                    .get("category")
                    .and_then(Value::as_str)
                    .and_then(QaCategory::from_key),
                question_id,
                suggestion: text.to_string(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use survose_llm::{LlmBackend, LlmError, ScriptedBackend};
    use survose_utils::Stage;

    fn draft() -> SurveyDraft {
        SurveyDraft::from_value(
            &json!({"title": "Commute", "questions": ["How do you get to work?"]}),
            "x",
        )
        .unwrap()
    }

    #[test]
    fn test_parse_suggestions_shapes() {
        let from_array = parse_suggestions(
            "suggestions",
            r#"["Shorten Q1", {"suggestion": "Add an age question", "category": "demographics"}, "  ", 4]"#,
        )
        .unwrap();
        assert_eq!(
            from_array,
            vec![
                Suggestion::new("Shorten Q1"),
                Suggestion {
                    category: Some(QaCategory::Demographics),
                    question_id: None,
                    suggestion: "Add an age question".to_string(),
                },
            ]
        );

        let from_object = parse_suggestions(
            "suggestions",
            r#"{"suggestions": [{"text": "Reword", "questionId": "q0", "category": "tone"}]}"#,
        )
        .unwrap();
        assert_eq!(from_object[0].question_id.as_deref(), Some("q0"));
        assert_eq!(from_object[0].category, None);
    }

    #[test]
    fn test_parse_suggestions_rejects_other_shapes() {
        assert!(matches!(
            parse_suggestions("suggestions", r#""just text""#),
            Err(GenerationError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            parse_suggestions("suggestions", r#"{"ideas": []}"#),
            Err(GenerationError::MissingField { .. })
        ));
        assert!(matches!(
            parse_suggestions("suggestions", r#"{"suggestions": "none"}"#),
            Err(GenerationError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            parse_suggestions("suggestions", "nope"),
            Err(GenerationError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_suggestion_serializes_camel_case() {
        let suggestion = Suggestion {
            category: Some(QaCategory::LeadingQuestions),
            question_id: Some("q2".to_string()),
            suggestion: "Drop 'obviously'".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&suggestion).unwrap(),
            json!({"category": "leadingQuestions", "questionId": "q2", "suggestion": "Drop 'obviously'"})
        );
    }

    #[tokio::test]
    async fn test_review_is_cached_per_survey() {
        let backend = Arc::new(ScriptedBackend::with_responses([
            r#"{"bias": ["b1"]}"#,
            r#"{"bias": ["b2"]}"#,
        ]));
        let generator = SurveyGenerator::new(backend.clone() as Arc<dyn LlmBackend>);
        let mut cache = ReviewCache::new();

        let first = generator.review_survey("s1", &draft(), &mut cache).await.unwrap();
        let again = generator.review_survey("s1", &draft(), &mut cache).await.unwrap();
        let other = generator.review_survey("s2", &draft(), &mut cache).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(first.survey_id.as_deref(), Some("s1"));
        assert_eq!(other.sections.bias, ["b2"]);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_suggestions_reuse_report_and_invalidate() {
        let backend = Arc::new(ScriptedBackend::with_responses([
            r#"{"clarity": ["Q1 vague"]}"#,
            r#"["Say 'usually' in Q1"]"#,
            r#"{"clarity": ["Better now"]}"#,
            r#"{"suggestions": []}"#,
        ]));
        let generator = SurveyGenerator::new(backend.clone() as Arc<dyn LlmBackend>);
        let mut cache = ReviewCache::new();

        let suggestions = generator
            .suggest_improvements("s1", &draft(), &mut cache)
            .await
            .unwrap();
        assert_eq!(suggestions, vec![Suggestion::new("Say 'usually' in Q1")]);
        assert!(cache.report("s1").is_some());

        // both cached now
        generator.review_survey("s1", &draft(), &mut cache).await.unwrap();
        generator
            .suggest_improvements("s1", &draft(), &mut cache)
            .await
            .unwrap();
        assert_eq!(backend.call_count(), 2);

        let stages: Vec<Stage> = backend.invocations().iter().map(|i| i.stage).collect();
        assert_eq!(stages, [Stage::Qa, Stage::Suggestions]);
        assert!(backend.invocations()[1].messages[1]
            .content
            .contains("- Q1 vague"));

        cache.invalidate("s1");
        assert!(cache.is_empty());

        let suggestions = generator
            .suggest_improvements("s1", &draft(), &mut cache)
            .await
            .unwrap();
        assert!(suggestions.is_empty());
        assert_eq!(cache.report("s1").unwrap().sections.clarity, ["Better now"]);
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test]
    async fn test_failed_review_is_not_cached() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_error(LlmError::ProviderOutage("503".to_string()));
        let generator = SurveyGenerator::new(backend.clone() as Arc<dyn LlmBackend>);
        let mut cache = ReviewCache::new();

        let err = generator
            .review_survey("s1", &draft(), &mut cache)
            .await
            .unwrap_err();

        assert!(matches!(err, SurvoseError::Llm(LlmError::ProviderOutage(_))));
        assert!(cache.is_empty());
    }
}
