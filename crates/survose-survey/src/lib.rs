//! Survey model for survose.
//!
//! Model output is duck-typed JSON. Everything entering the pipeline goes
//! through [`normalize_questions`] (or [`SurveyDraft::from_value`]) so the rest
//! of the code only ever sees the strict [`Question`] shape.

pub mod analysis;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod render;
pub mod report;
pub mod script;
mod value;

pub use analysis::{
    AnswerCount, QuestionDistribution, ResponseSummary, SKIPPED_LABEL, response_records,
    summarize_responses,
};
pub use extract::{JsonExtractError, extract_json};
pub use model::{
    DEFAULT_TITLE, DraftError, Question, QuestionOptions, QuestionType, RawQuestion, SurveyDraft,
};
pub use normalize::normalize_questions;
pub use render::{format_report_for_prompt, format_survey_for_prompt, format_survey_for_qa};
pub use report::{QaCategory, QaReport, QaSections, ReportShapeError, qa_response_schema};
pub use script::{
    QuestionBlock, ScriptDetails, ScriptEntry, SkipReason, SkippedQuestion, VoiceScript,
    build_question_block, build_voice_script, build_voice_script_from_payload,
};
