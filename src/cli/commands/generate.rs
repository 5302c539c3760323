//! `survose generate`

use anyhow::Result;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use super::common::{emit, to_pretty_json};
use crate::{Config, PipelineSettings, SurveyGenerator, SurvoseError};
use survose_utils::error::GenerationError;

/// Prompt from the argument, or stdin when omitted. Blank prompts are
/// rejected before any backend is built.
pub fn resolve_prompt(arg: Option<String>) -> Result<String, SurvoseError> {
    let prompt = match arg {
        Some(prompt) => prompt,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GenerationError::EmptyPrompt.into());
    }
    Ok(prompt.to_string())
}

/// Execute the generate command
pub async fn execute_generate_command(
    prompt: Option<String>,
    out: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let prompt = resolve_prompt(prompt)?;

    let backend = survose_llm::from_config(config).map_err(SurvoseError::from)?;
    let generator =
        SurveyGenerator::with_settings(Arc::from(backend), PipelineSettings::from_config(config));

    let survey = generator.generate(&prompt).await?;
    tracing::info!(
        title = %survey.title,
        questions = survey.questions.len(),
        "Survey generated"
    );

    emit(out, &to_pretty_json(&survey)?)
}
