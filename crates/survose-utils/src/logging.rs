//! Logging infrastructure for survose
//!
//! Structured logging via `tracing`. The CLI calls [`init_tracing`] once; the
//! pipeline uses the stage helpers so every stage logs the same fields.

use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_secrets;

/// Default filter directives when `RUST_LOG` is unset.
#[must_use]
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "survose=debug,survose_pipeline=debug,survose_llm=debug,info"
    } else {
        "survose=info,survose_pipeline=info,warn"
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the built-in filter. Verbose mode adds targets and
/// span close events (which carry stage durations). Output goes to stderr so
/// stdout stays clean for survey JSON.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false);

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                layer
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_target(false).compact())
            .try_init()?;
    }

    Ok(())
}

/// Span wrapping one pipeline stage invocation.
pub fn stage_span(request_id: &str, stage: &str, model: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "stage",
        request_id = %request_id,
        stage = %stage,
        model = %model,
    )
}

pub fn log_stage_start(request_id: &str, stage: &str) {
    info!(request_id = %request_id, stage = %stage, "Starting stage");
}

pub fn log_stage_complete(request_id: &str, stage: &str, duration_ms: u128) {
    info!(
        request_id = %request_id,
        stage = %stage,
        duration_ms = %duration_ms,
        "Stage completed"
    );
}

/// Log a stage failure. The error text is redacted first.
pub fn log_stage_error(request_id: &str, stage: &str, error: &str, duration_ms: u128) {
    let sanitized_error = redact_secrets(error);
    error!(
        request_id = %request_id,
        stage = %stage,
        duration_ms = %duration_ms,
        error = %sanitized_error,
        "Stage failed"
    );
}
