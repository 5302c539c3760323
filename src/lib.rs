//! survose - AI survey generation, review, and voice scripts
//!
//! survose authors surveys for phone-based voice agents. A staged model
//! pipeline drafts, audits, revises and approves a survey; the result is
//! normalized into a strict question model that downstream tools can trust.
//!
//! survose can be used in two ways:
//! - **CLI**: `survose generate "customer satisfaction for a bike shop"`
//! - **Library**: drive [`SurveyGenerator`] with any [`LlmBackend`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! export GEMINI_API_KEY=...
//!
//! # Generate a survey from a topic
//! survose generate "Commuting habits of remote workers" --out survey.json
//!
//! # Review an existing survey
//! survose qa survey.json
//! survose suggest survey.json --json
//!
//! # Render the phone script
//! survose script survey.json
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use survose::{Config, SurveyGenerator, PipelineSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder().model("gemini-2.5-flash").build()?;
//! let backend = survose::llm::from_config(&config)?;
//! let generator = SurveyGenerator::with_settings(
//!     Arc::from(backend),
//!     PipelineSettings::from_config(&config),
//! );
//! let survey = generator.generate("Gym member satisfaction").await?;
//! println!("{}", survey.title);
//! # Ok(())
//! # }
//! ```

pub mod cli;

pub use survose_config as config;
pub use survose_llm as llm;
pub use survose_pipeline as pipeline;
pub use survose_survey as survey;
pub use survose_utils as utils;

pub use survose_config::{CliArgs, Config, ConfigBuilder};
pub use survose_llm::{LlmBackend, LlmInvocation, LlmResult};
pub use survose_pipeline::{
    PipelineSettings, ReviewCache, Suggestion, SurveyGenerator, generate_survey_with_ai,
};
pub use survose_survey::{Question, QuestionType, SurveyDraft, VoiceScript};
pub use survose_utils::error::{SurvoseError, UserFriendlyError};
pub use survose_utils::exit_codes::ExitCode;
pub use survose_utils::types::Stage;
