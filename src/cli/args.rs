//! CLI argument definitions (clap derive)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// survose - AI survey generation for voice agents
#[derive(Parser, Debug)]
#[command(name = "survose")]
#[command(about = "Generate, review, and script surveys for phone-based voice agents")]
#[command(long_about = r#"
survose drafts surveys with a staged model pipeline (creator → QA → questioner →
analyzer), reviews existing surveys, and renders the script a voice agent reads
on a call.

EXAMPLES:
  # Generate a survey from a topic
  survose generate "Satisfaction with our weekend bike rentals"

  # Read the topic from stdin and write the survey to a file
  echo "Remote work commute habits" | survose generate --out survey.json

  # QA report and improvement suggestions for an existing survey
  survose qa survey.json
  survose suggest survey.json --json

  # Phone script, or its structured form
  survose script survey.json
  survose script survey.json --json

  # Repair a hand-written survey into the strict question model
  survose normalize draft.json

  # Response counts, completion rate and per-question answer distributions
  survose analyze survey.json responses.json

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults
  The config file is discovered by searching upward from CWD for .survose/config.toml
  The Gemini API key is read from GEMINI_API_KEY unless [llm.gemini] api_key_env says otherwise

EXIT CODES:
  0 success, 1 internal, 2 usage/configuration, 3 invalid survey input,
  10 model call timed out, 65 generation failed, 70 model service failure
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model for every stage (stage overrides in the config file still apply)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Model provider (supported: gemini)
    #[arg(long = "provider", global = true)]
    pub llm_provider: Option<String>,

    /// Timeout for each model call in seconds (5-3600)
    #[arg(long, global = true)]
    pub stage_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write output to this file instead of stdout
    #[arg(short, long, global = true)]
    pub out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a survey from a description of its topic
    ///
    /// Runs creator, QA, questioner and analyzer (plus at most one more
    /// questioner/analyzer round) and prints the normalized survey as JSON.
    Generate {
        /// Survey topic; read from stdin when omitted
        prompt: Option<String>,
    },

    /// Run the QA review on a survey file
    Qa {
        /// Survey JSON file (`-` for stdin)
        file: PathBuf,

        /// Survey id recorded in the report (defaults to the file's `id` or name)
        #[arg(long)]
        id: Option<String>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest concrete improvements for a survey file
    Suggest {
        /// Survey JSON file (`-` for stdin)
        file: PathBuf,

        /// Survey id used for the review (defaults to the file's `id` or name)
        #[arg(long)]
        id: Option<String>,

        /// Emit suggestions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the spoken script for a survey file
    Script {
        /// Survey JSON file (`-` for stdin)
        file: PathBuf,

        /// Emit title, prompt, question JSON and skipped questions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize a survey file into the strict question model
    Normalize {
        /// Survey JSON file (`-` for stdin)
        file: PathBuf,
    },

    /// Summarize collected responses for a survey
    ///
    /// Reports the response count, completion rate and, per question, how
    /// often each answer was given. Missing answers count as "(skipped)".
    Analyze {
        /// Survey JSON file (`-` for stdin)
        survey: PathBuf,

        /// Responses JSON file: an array of `{completed, answers}` records,
        /// or an object with a `responses` array
        responses: PathBuf,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Subcommand name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Generate { .. } => "generate",
            Commands::Qa { .. } => "qa",
            Commands::Suggest { .. } => "suggest",
            Commands::Script { .. } => "script",
            Commands::Normalize { .. } => "normalize",
            Commands::Analyze { .. } => "analyze",
        }
    }

    /// Whether the subcommand talks to the model service.
    #[must_use]
    pub fn needs_backend(&self) -> bool {
        matches!(
            self,
            Commands::Generate { .. } | Commands::Qa { .. } | Commands::Suggest { .. }
        )
    }
}

/// Build the CLI command structure without parsing arguments
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
