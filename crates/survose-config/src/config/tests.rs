//! Tests for configuration discovery, precedence, and validation

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serial_test::serial;
use survose_utils::Stage;
use survose_utils::error::ConfigError;
use tempfile::TempDir;

use super::*;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_dir = dir.join(CONFIG_DIR);
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join(CONFIG_FILE);
    fs::write(&config_path, content).unwrap();
    config_path
}

fn create_git_marker(dir: &Path) {
    fs::create_dir_all(dir.join(".git")).unwrap();
}

struct ProviderEnvGuard;

impl ProviderEnvGuard {
    fn set(value: &str) -> Self {
        // SAFETY: tests touching this variable are #[serial].
        unsafe { std::env::set_var(PROVIDER_ENV_VAR, value) };
        Self
    }
}

impl Drop for ProviderEnvGuard {
    fn drop(&mut self) {
        // SAFETY: see ProviderEnvGuard::set
        unsafe { std::env::remove_var(PROVIDER_ENV_VAR) };
    }
}

#[test]
#[serial]
fn test_defaults_without_config_file() {
    let temp = TempDir::new().unwrap();
    create_git_marker(temp.path());

    let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();

    assert_eq!(config.model_for_stage(Stage::Creator), DEFAULT_MODEL);
    assert_eq!(config.stage_timeout(), Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS));
    assert!(!config.verbose());
    assert_eq!(config.provider(), "gemini");
    assert_eq!(
        config.source_attribution.get("llm_provider"),
        Some(&ConfigSource::Defaults)
    );
}

#[test]
#[serial]
fn test_upward_discovery_finds_parent_config() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    create_git_marker(root);
    let config_path = create_config_file(
        root,
        r#"
[defaults]
model = "gemini-2.5-pro"
stage_timeout = 60
"#,
    );
    let nested = root.join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    assert_eq!(Config::discover_config_file_from(&nested), Some(config_path.clone()));

    let config = Config::discover_from(&nested, &CliArgs::default()).unwrap();
    assert_eq!(config.model_for_stage(Stage::Qa), "gemini-2.5-pro");
    assert_eq!(config.stage_timeout(), Duration::from_secs(60));
    assert_eq!(
        config.source_attribution.get("model"),
        Some(&ConfigSource::ConfigFile(config_path))
    );
}

#[test]
fn test_discovery_stops_at_repository_root() {
    let temp = TempDir::new().unwrap();
    let outer = temp.path();
    create_config_file(outer, "[defaults]\nmodel = \"outer\"\n");
    let repo = outer.join("repo");
    fs::create_dir_all(&repo).unwrap();
    create_git_marker(&repo);
    let inner = repo.join("src");
    fs::create_dir_all(&inner).unwrap();

    assert_eq!(Config::discover_config_file_from(&inner), None);
}

#[test]
#[serial]
fn test_cli_overrides_file() {
    let temp = TempDir::new().unwrap();
    create_git_marker(temp.path());
    create_config_file(
        temp.path(),
        r#"
[defaults]
model = "from-file"
stage_timeout = 60
verbose = false
"#,
    );

    let cli = CliArgs {
        model: Some("from-cli".to_string()),
        stage_timeout: Some(30),
        verbose: Some(true),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp.path(), &cli).unwrap();

    assert_eq!(config.model_for_stage(Stage::Creator), "from-cli");
    assert_eq!(config.stage_timeout(), Duration::from_secs(30));
    assert!(config.verbose());
    assert_eq!(config.source_attribution.get("model"), Some(&ConfigSource::Cli));
    assert_eq!(
        config.source_attribution.get("stage_timeout"),
        Some(&ConfigSource::Cli)
    );
}

#[test]
#[serial]
fn test_environment_overrides_file_provider() {
    let temp = TempDir::new().unwrap();
    create_git_marker(temp.path());
    create_config_file(temp.path(), "[llm]\nprovider = \"gemini\"\n");
    let _guard = ProviderEnvGuard::set("gemini");

    let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();

    assert_eq!(
        config.source_attribution.get("llm_provider"),
        Some(&ConfigSource::Environment)
    );
}

#[test]
#[serial]
fn test_cli_provider_beats_environment() {
    let temp = TempDir::new().unwrap();
    create_git_marker(temp.path());
    let _guard = ProviderEnvGuard::set("not-a-provider");

    let cli = CliArgs {
        llm_provider: Some("gemini".to_string()),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp.path(), &cli).unwrap();

    assert_eq!(config.provider(), "gemini");
    assert_eq!(
        config.source_attribution.get("llm_provider"),
        Some(&ConfigSource::Cli)
    );
}

#[test]
#[serial]
fn test_unknown_provider_from_environment_is_rejected() {
    let temp = TempDir::new().unwrap();
    create_git_marker(temp.path());
    let _guard = ProviderEnvGuard::set("openai");

    let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
    let config_err = err.downcast_ref::<ConfigError>().unwrap();
    assert!(matches!(config_err, ConfigError::InvalidValue { key, .. } if key == "provider"));
}

#[test]
#[serial]
fn test_stage_overrides_and_gemini_section() {
    let temp = TempDir::new().unwrap();
    create_git_marker(temp.path());
    create_config_file(
        temp.path(),
        r#"
[llm]
budget = 12

[llm.gemini]
api_key_env = "MY_GEMINI_KEY"
model = "gemini-2.0-flash"
temperature = 0.4
max_tokens = 4096

[stages.analyzer]
model = "gemini-2.5-pro"
"#,
    );

    let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();

    assert_eq!(config.model_for_stage(Stage::Analyzer), "gemini-2.5-pro");
    // no [defaults] model, so the provider default applies
    assert_eq!(config.model_for_stage(Stage::Creator), "gemini-2.0-flash");
    assert_eq!(config.llm.budget, Some(12));
    let gemini = config.llm.gemini.as_ref().unwrap();
    assert_eq!(gemini.api_key_env.as_deref(), Some("MY_GEMINI_KEY"));
    assert_eq!(gemini.max_tokens, Some(4096));
}

#[test]
fn test_explicit_config_path_is_used() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");
    fs::write(&path, "[defaults]\nmodel = \"explicit\"\n").unwrap();

    let cli = CliArgs {
        config_path: Some(path),
        llm_provider: Some("gemini".to_string()),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp.path(), &cli).unwrap();

    assert_eq!(config.model_for_stage(Stage::Questioner), "explicit");
}

#[test]
fn test_missing_explicit_config_path_is_an_error() {
    let temp = TempDir::new().unwrap();
    let cli = CliArgs {
        config_path: Some(temp.path().join("nope.toml")),
        ..CliArgs::default()
    };

    let err = Config::discover_from(temp.path(), &cli).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NotFound { .. })
    ));
}

#[test]
fn test_invalid_toml_is_reported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    fs::write(&path, "[defaults\nmodel = ").unwrap();
    let cli = CliArgs {
        config_path: Some(path),
        llm_provider: Some("gemini".to_string()),
        ..CliArgs::default()
    };

    let err = Config::discover_from(temp.path(), &cli).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid configuration file"));
}

#[test]
fn test_unknown_keys_are_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("typo.toml");
    fs::write(&path, "[defaults]\nstage_timout = 30\n").unwrap();
    let cli = CliArgs {
        config_path: Some(path),
        llm_provider: Some("gemini".to_string()),
        ..CliArgs::default()
    };

    assert!(Config::discover_from(temp.path(), &cli).is_err());
}

#[test]
fn test_validation_ranges() {
    let too_short = Config::builder()
        .stage_timeout(Duration::from_secs(4))
        .build()
        .unwrap_err();
    assert!(matches!(too_short, ConfigError::InvalidValue { key, .. } if key == "stage_timeout"));

    let too_long = Config::builder()
        .stage_timeout(Duration::from_secs(3601))
        .build()
        .unwrap_err();
    assert!(matches!(too_long, ConfigError::InvalidValue { key, .. } if key == "stage_timeout"));

    let hot = Config::builder()
        .gemini(GeminiConfig {
            temperature: Some(2.5),
            ..GeminiConfig::default()
        })
        .build()
        .unwrap_err();
    assert!(matches!(hot, ConfigError::InvalidValue { key, .. } if key == "temperature"));

    let zero_budget = Config::builder().budget(0).build().unwrap_err();
    assert!(matches!(zero_budget, ConfigError::InvalidValue { key, .. } if key == "budget"));

    let bad_provider = Config::builder().llm_provider("openai").build().unwrap_err();
    assert!(matches!(bad_provider, ConfigError::InvalidValue { key, .. } if key == "provider"));

    assert!(
        Config::builder()
            .stage_timeout(Duration::from_secs(5))
            .gemini(GeminiConfig {
                temperature: Some(0.0),
                ..GeminiConfig::default()
            })
            .build()
            .is_ok()
    );
}

#[test]
fn test_builder_attributes_programmatic_source() {
    let config = Config::builder()
        .model("m")
        .stage_model(Stage::Qa, "qa-model")
        .budget(3)
        .build()
        .unwrap();

    assert_eq!(
        config.source_attribution.get("model"),
        Some(&ConfigSource::Programmatic)
    );
    assert_eq!(config.model_for_stage(Stage::Qa), "qa-model");
    assert_eq!(config.model_for_stage(Stage::Suggestions), "m");

    let effective = config.effective_config();
    assert_eq!(effective["model.qa"], ("qa-model".to_string(), "programmatic".to_string()));
    assert_eq!(effective["llm_budget"].0, "3");
    assert_eq!(effective["llm_provider"].1, "default");
}

#[test]
fn test_minimal_for_testing_uses_hard_defaults() {
    let config = Config::minimal_for_testing();
    assert_eq!(config.model_for_stage(Stage::Analyzer), DEFAULT_MODEL);
    assert_eq!(config.provider(), DEFAULT_PROVIDER);
}
