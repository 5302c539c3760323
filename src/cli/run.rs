//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{CliArgs, Config, ExitCode, SurvoseError};
use survose_utils::error::ConfigError;
use survose_utils::logging::init_tracing;
use survose_utils::redaction::redact_secrets;

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns `Err(ExitCode)` on
/// failure. main.rs only calls `std::process::exit`; it does NOT print.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let cli_args = cli_args_from(&cli);

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let err = config_error_from_anyhow(&err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("⚠ Failed to initialize logging: {e}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.name();
    tracing::debug!(operation, provider = config.provider(), "Dispatching command");

    let out = cli.out.clone();
    let result = rt.block_on(async {
        match cli.command {
            Commands::Generate { prompt } => {
                commands::execute_generate_command(prompt, out.as_deref(), &config).await
            }
            Commands::Qa { file, id, json } => {
                commands::execute_qa_command(&file, id.as_deref(), json, out.as_deref(), &config)
                    .await
            }
            Commands::Suggest { file, id, json } => {
                commands::execute_suggest_command(
                    &file,
                    id.as_deref(),
                    json,
                    out.as_deref(),
                    &config,
                )
                .await
            }
            Commands::Script { file, json } => {
                commands::execute_script_command(&file, json, out.as_deref())
            }
            Commands::Normalize { file } => {
                commands::execute_normalize_command(&file, out.as_deref())
            }
            Commands::Analyze {
                survey,
                responses,
                json,
            } => commands::execute_analyze_command(&survey, &responses, json, out.as_deref()),
        }
    });

    if let Err(error) = result {
        if let Some(survose_error) = error.downcast_ref::<SurvoseError>() {
            tracing::debug!(operation, error = %survose_error, "Command failed");
            eprintln!("{}", survose_error.display_for_user());
            return Err(survose_error.to_exit_code());
        }

        eprintln!("✗ Unexpected error: {}", redact_secrets(&format!("{error:#}")));
        eprintln!("\n  Run with --verbose for more detailed output");
        return Err(ExitCode::INTERNAL);
    }

    Ok(())
}

/// Configuration overrides from parsed flags. `--verbose` only overrides
/// when given, so `[defaults] verbose = true` still applies otherwise.
pub(crate) fn cli_args_from(cli: &Cli) -> CliArgs {
    CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        llm_provider: cli.llm_provider.clone(),
        stage_timeout: cli.stage_timeout,
        verbose: cli.verbose.then_some(true),
    }
}

/// Recover the typed config error from a discovery failure.
pub(crate) fn config_error_from_anyhow(err: &anyhow::Error) -> SurvoseError {
    let typed = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ConfigError>())
        .cloned()
        .unwrap_or_else(|| ConfigError::InvalidFile(format!("{err:#}")));
    SurvoseError::Config(typed)
}
