//! Exit code constants for the survose CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `INVALID_SURVEY` | Survey input could not be read or has no usable questions |
//! | 10 | `STAGE_TIMEOUT` | A model call exceeded its timeout |
//! | 65 | `GENERATION_FAILED` | A model response broke the stage's JSON contract |
//! | 70 | `LLM_FAILURE` | The generative text service call failed |

/// Exit codes matching the documented exit code table.
///
/// The numeric values are part of the CLI contract and do not change.
///
/// ```rust
/// use survose_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(65), ExitCode::GENERATION_FAILED);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid flags or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Invalid survey - input file unreadable, malformed, or without valid questions
    pub const INVALID_SURVEY: ExitCode = ExitCode(3);

    /// Stage timeout - a model invocation exceeded its timeout
    pub const STAGE_TIMEOUT: ExitCode = ExitCode(10);

    /// Generation failed - a stage response did not parse into the expected shape
    pub const GENERATION_FAILED: ExitCode = ExitCode(65);

    /// LLM failure - the generative text service call itself failed
    pub const LLM_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value for `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
