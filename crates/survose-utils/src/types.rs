use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use strum::{EnumIter, IntoStaticStr};

/// A step of the survey pipeline that talks to the model.
///
/// Generation runs `Creator → Qa → Questioner → Analyzer` (plus at most one
/// more `Questioner → Analyzer` round). `Suggestions` is used only by survey
/// review.
///
/// ```rust
/// use survose_utils::types::Stage;
///
/// assert_eq!(Stage::Questioner.as_str(), "questioner");
/// assert_eq!("qa".parse::<Stage>().unwrap(), Stage::Qa);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Drafts the survey from the user's topic.
    Creator,
    /// Audits the draft and produces the six-section report.
    Qa,
    /// Rewrites the draft from the report and analyzer feedback.
    Questioner,
    /// Compares the draft with its revision and approves or objects.
    Analyzer,
    /// Turns a QA report into concrete per-question fixes.
    Suggestions,
}

impl Stage {
    /// Canonical lowercase name used in config keys and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(Self::Creator),
            "qa" => Ok(Self::Qa),
            "questioner" => Ok(Self::Questioner),
            "analyzer" => Ok(Self::Analyzer),
            "suggestions" => Ok(Self::Suggestions),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Command-line flag (highest precedence).
    Cli,
    /// Environment variable.
    Environment,
    /// Discovered or explicit config file.
    ConfigFile(PathBuf),
    /// Set through `ConfigBuilder`.
    Programmatic,
    /// Built-in default.
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Environment => write!(f, "env"),
            Self::ConfigFile(path) => write!(f, "config file ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "default"),
        }
    }
}
