//! One model call per stage, with the JSON contract each stage enforces.

use std::time::Instant;

use serde_json::{Value, json};
use survose_llm::{LlmError, LlmInvocation, Message, ResponseFormat};
use survose_survey::{
    DEFAULT_TITLE, DraftError, QaReport, SurveyDraft, extract_json, qa_response_schema,
};
use survose_utils::Stage;
use survose_utils::error::{GenerationError, SurvoseError};
use survose_utils::logging::{log_stage_complete, log_stage_error, log_stage_start, stage_span};
use tracing::{Instrument, debug, warn};

use crate::generator::{AnalyzerVerdict, SurveyGenerator};
use crate::prompts;
use crate::review::{Suggestion, parse_suggestions};

impl SurveyGenerator {
    /// Draft a survey from the user's topic.
    ///
    /// # Errors
    ///
    /// `GenerationError` when the answer is not JSON or lacks a non-empty
    /// `questions` array; backend errors as-is.
    pub async fn run_creator(
        &self,
        request_id: &str,
        user_prompt: &str,
    ) -> Result<SurveyDraft, SurvoseError> {
        self.run_stage(
            request_id,
            Stage::Creator,
            prompts::CREATOR_SYSTEM,
            prompts::creator_user(user_prompt),
            ResponseFormat::Json,
            |text| parse_draft(Stage::Creator, text, DEFAULT_TITLE),
        )
        .await
    }

    /// Audit a draft. Sections the model omits or mangles come back empty.
    ///
    /// # Errors
    ///
    /// `GenerationError` when the answer is not a JSON object.
    pub async fn run_qa(
        &self,
        request_id: &str,
        draft: &SurveyDraft,
    ) -> Result<QaReport, SurvoseError> {
        self.run_stage(
            request_id,
            Stage::Qa,
            prompts::QA_SYSTEM,
            prompts::qa_user(draft),
            ResponseFormat::JsonSchema(qa_response_schema()),
            parse_report,
        )
        .await
    }

    /// Revise `draft` from the report and optional analyzer feedback.
    ///
    /// A missing title keeps the title of `draft`.
    ///
    /// # Errors
    ///
    /// Same contract as [`SurveyGenerator::run_creator`].
    pub async fn run_questioner(
        &self,
        request_id: &str,
        draft: &SurveyDraft,
        report: &QaReport,
        feedback: Option<&str>,
    ) -> Result<SurveyDraft, SurvoseError> {
        self.run_stage(
            request_id,
            Stage::Questioner,
            prompts::QUESTIONER_SYSTEM,
            prompts::questioner_user(draft, report, feedback),
            ResponseFormat::Json,
            |text| parse_draft(Stage::Questioner, text, &draft.title),
        )
        .await
    }

    /// Judge `revised` against `original`.
    ///
    /// An answer that cannot be read as `{approved: bool}` counts as approval.
    ///
    /// # Errors
    ///
    /// Backend errors only.
    pub async fn run_analyzer(
        &self,
        request_id: &str,
        original: &SurveyDraft,
        revised: &SurveyDraft,
    ) -> Result<AnalyzerVerdict, SurvoseError> {
        self.run_stage(
            request_id,
            Stage::Analyzer,
            prompts::ANALYZER_SYSTEM,
            prompts::analyzer_user(original, revised),
            ResponseFormat::Json,
            |text| Ok(parse_verdict(text)),
        )
        .await
    }

    /// Ask for concrete fixes addressing `report`.
    ///
    /// # Errors
    ///
    /// `GenerationError` when the answer is neither a suggestion array nor an
    /// object holding one.
    pub async fn run_suggestions(
        &self,
        request_id: &str,
        draft: &SurveyDraft,
        report: &QaReport,
    ) -> Result<Vec<Suggestion>, SurvoseError> {
        self.run_stage(
            request_id,
            Stage::Suggestions,
            prompts::SUGGESTIONS_SYSTEM,
            prompts::suggestions_user(draft, report),
            ResponseFormat::Json,
            |text| parse_suggestions(Stage::Suggestions.as_str(), text).map_err(Into::into),
        )
        .await
    }

    /// Invoke the backend for one stage and parse its answer.
    ///
    /// Logs start, completion and failure inside a stage span. The call is
    /// bounded by the stage timeout even when the backend ignores it.
    async fn run_stage<T>(
        &self,
        request_id: &str,
        stage: Stage,
        system_prompt: &str,
        user_message: String,
        format: ResponseFormat,
        parse: impl FnOnce(&str) -> Result<T, SurvoseError>,
    ) -> Result<T, SurvoseError> {
        let model = self.settings.model_for(stage).to_string();
        let timeout = self.settings.stage_timeout;
        let span = stage_span(request_id, stage.as_str(), &model);

        async move {
            let started = Instant::now();
            log_stage_start(request_id, stage.as_str());

            let mut invocation = LlmInvocation::new(
                request_id,
                stage,
                model,
                timeout,
                vec![Message::system(system_prompt), Message::user(user_message)],
            )
            .with_response_format(format);
            if let Some(temperature) = self.settings.temperature {
                invocation = invocation.with_metadata("temperature", json!(temperature));
            }

            let outcome = match tokio::time::timeout(timeout, self.backend.invoke(invocation)).await
            {
                Ok(result) => result.map_err(SurvoseError::from),
                Err(_) => Err(LlmError::Timeout { duration: timeout }.into()),
            }
            .and_then(|result| {
                debug!(
                    provider = %result.provider,
                    model_used = %result.model_used,
                    tokens_input = ?result.tokens_input,
                    tokens_output = ?result.tokens_output,
                    "Stage response received"
                );
                parse(&result.raw_response)
            });

            let elapsed = started.elapsed().as_millis();
            match &outcome {
                Ok(_) => log_stage_complete(request_id, stage.as_str(), elapsed),
                Err(e) => log_stage_error(request_id, stage.as_str(), &e.to_string(), elapsed),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

fn parse_json(stage: Stage, text: &str) -> Result<Value, GenerationError> {
    extract_json(text).map_err(|e| GenerationError::InvalidJson {
        stage: stage.to_string(),
        reason: e.to_string(),
    })
}

fn parse_draft(stage: Stage, text: &str, fallback_title: &str) -> Result<SurveyDraft, SurvoseError> {
    let value = parse_json(stage, text)?;
    SurveyDraft::from_value(&value, fallback_title).map_err(|e| {
        let stage = stage.to_string();
        let error = match e {
            DraftError::NotAnObject => GenerationError::UnexpectedShape {
                stage,
                expected: "a JSON object with 'title' and 'questions'".to_string(),
            },
            DraftError::MissingQuestions => GenerationError::MissingField {
                stage,
                field: "questions".to_string(),
            },
            DraftError::QuestionsNotArray => GenerationError::UnexpectedShape {
                stage,
                expected: "'questions' to be an array".to_string(),
            },
            DraftError::NoQuestions => GenerationError::EmptySurvey { stage },
        };
        error.into()
    })
}

fn parse_report(text: &str) -> Result<QaReport, SurvoseError> {
    let value = parse_json(Stage::Qa, text)?;
    QaReport::from_value(&value).map_err(|_| {
        GenerationError::UnexpectedShape {
            stage: Stage::Qa.to_string(),
            expected: "a JSON object with QA sections".to_string(),
        }
        .into()
    })
}

fn parse_verdict(text: &str) -> AnalyzerVerdict {
    let value = match extract_json(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Analyzer answer is not JSON, treating as approved");
            return AnalyzerVerdict::approve();
        }
    };

    match value.get("approved").and_then(Value::as_bool) {
        Some(approved) => AnalyzerVerdict {
            approved,
            feedback: value
                .get("feedback")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        None => {
            warn!("Analyzer answer has no boolean 'approved', treating as approved");
            AnalyzerVerdict::approve()
        }
    }
}
