//! Survey generation: creator → QA → questioner → analyzer, with at most one
//! feedback round.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use survose_llm::LlmBackend;
use survose_survey::SurveyDraft;
use survose_utils::error::{GenerationError, SurvoseError};
use tracing::{info, info_span, Instrument};

use crate::settings::PipelineSettings;

/// Extra questioner/analyzer rounds allowed after a rejection
pub const MAX_REFINEMENT_ROUNDS: usize = 1;

/// Upper bound on model calls for one `generate` run
pub const MAX_GENERATION_CALLS: usize = 4 + 2 * MAX_REFINEMENT_ROUNDS;

/// The analyzer's decision on a revision. Lives for one run only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerVerdict {
    pub approved: bool,
    #[serde(default)]
    pub feedback: String,
}

impl AnalyzerVerdict {
    /// Verdict used when the analyzer's answer cannot be read.
    #[must_use]
    pub fn approve() -> Self {
        Self {
            approved: true,
            feedback: String::new(),
        }
    }

    /// Whether another questioner round should run.
    #[must_use]
    pub fn wants_revision(&self) -> bool {
        !self.approved && !self.feedback.trim().is_empty()
    }
}

/// Runs the survey stages against one backend.
///
/// Holds no state between runs; every call to [`SurveyGenerator::generate`]
/// starts from scratch.
#[derive(Clone)]
pub struct SurveyGenerator {
    pub(crate) backend: Arc<dyn LlmBackend>,
    pub(crate) settings: PipelineSettings,
}

impl SurveyGenerator {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self::with_settings(backend, PipelineSettings::default())
    }

    #[must_use]
    pub fn with_settings(backend: Arc<dyn LlmBackend>, settings: PipelineSettings) -> Self {
        Self { backend, settings }
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Generate a normalized survey from a free-text description.
    ///
    /// Calls are strictly sequential. Model service errors propagate
    /// unchanged; only a malformed analyzer answer is tolerated (read as
    /// approval).
    ///
    /// # Errors
    ///
    /// - [`GenerationError::EmptyPrompt`] before any call for a blank prompt
    /// - [`GenerationError`] when a creator, QA or questioner answer is unusable
    /// - [`survose_utils::error::LlmError`] from the backend
    pub async fn generate(&self, user_prompt: &str) -> Result<SurveyDraft, SurvoseError> {
        let user_prompt = user_prompt.trim();
        if user_prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt.into());
        }

        let request_id = new_request_id("gen");
        let span = info_span!("generate", request_id = %request_id);

        async {
            let draft = self.run_creator(&request_id, user_prompt).await?;
            let report = self.run_qa(&request_id, &draft).await?;
            let mut revised = self.run_questioner(&request_id, &draft, &report, None).await?;
            let mut verdict = self.run_analyzer(&request_id, &draft, &revised).await?;

            let mut rounds = 0;
            while verdict.wants_revision() && rounds < MAX_REFINEMENT_ROUNDS {
                rounds += 1;
                info!(round = rounds, feedback = %verdict.feedback, "Analyzer rejected revision");
                revised = self
                    .run_questioner(&request_id, &revised, &report, Some(&verdict.feedback))
                    .await?;
                verdict = self.run_analyzer(&request_id, &draft, &revised).await?;
            }

            if !verdict.approved {
                info!(feedback = %verdict.feedback, "Returning revision without analyzer approval");
            }

            let survey = revised.normalized();
            info!(
                title = %survey.title,
                questions = survey.questions.len(),
                refinement_rounds = rounds,
                "Survey generated"
            );
            Ok(survey)
        }
        .instrument(span)
        .await
    }
}

/// Generate a survey with default settings.
///
/// # Errors
///
/// See [`SurveyGenerator::generate`].
pub async fn generate_survey_with_ai(
    backend: Arc<dyn LlmBackend>,
    user_prompt: &str,
) -> Result<SurveyDraft, SurvoseError> {
    SurveyGenerator::new(backend).generate(user_prompt).await
}

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier correlating the log lines of one run.
pub(crate) fn new_request_id(prefix: &str) -> String {
    let n = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{n}", Utc::now().format("%Y%m%dT%H%M%S%3f"))
}
