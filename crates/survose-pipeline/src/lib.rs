//! Survey generation and review pipeline for survose
//!
//! [`SurveyGenerator`] drives a fixed sequence of model calls, each with a
//! JSON contract:
//!
//! 1. creator drafts `{title, questions}` from the user's topic
//! 2. QA audits the draft into six finding categories
//! 3. questioner revises the draft from the report
//! 4. analyzer approves the revision or sends feedback for one more round
//!
//! The surviving revision is normalized before it is returned. The same
//! generator also reviews existing surveys (see [`review`]).

pub mod generator;
pub mod prompts;
pub mod review;
pub mod settings;
mod stages;

pub use generator::{
    AnalyzerVerdict, MAX_GENERATION_CALLS, MAX_REFINEMENT_ROUNDS, SurveyGenerator,
    generate_survey_with_ai,
};
pub use review::{ReviewCache, Suggestion};
pub use settings::PipelineSettings;
pub use survose_utils::Stage;
