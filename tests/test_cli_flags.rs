//! CLI flag wiring and offline command output
//!
//! Runs the compiled `survose` binary in a temp directory with a repository
//! marker, so no config file outside the test is ever discovered.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".git")).unwrap();
    temp
}

fn survose(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("survose"));
    cmd.current_dir(dir)
        .env_remove("GEMINI_API_KEY")
        .env_remove("SURVOSE_LLM_PROVIDER")
        .env_remove("SURVOSE_LLM_BUDGET")
        .env_remove("RUST_LOG");
    cmd
}

const SURVEY: &str = r#"{
    "title": "Bike Rental Feedback",
    "questions": [
        {"id": "q0", "text": "How was your ride?", "type": "open_ended"},
        {"id": "q1", "text": "Rate the bike", "type": "scale", "options": {"min": 1, "max": 5}},
        {"id": "q2", "text": "", "type": "open_ended"}
    ]
}"#;

#[test]
fn test_all_global_flags_defined() {
    let cli = survose::cli::build_cli();
    let names: Vec<&str> = cli.get_arguments().filter_map(|a| a.get_long()).collect();

    for flag in ["config", "model", "provider", "stage-timeout", "verbose", "out"] {
        assert!(names.contains(&flag), "missing global flag --{flag}");
    }

    let subcommands: Vec<&str> = cli.get_subcommands().map(|s| s.get_name()).collect();
    for name in [
        "generate",
        "qa",
        "suggest",
        "script",
        "normalize",
        "analyze",
    ] {
        assert!(subcommands.contains(&name), "missing subcommand {name}");
    }
}

#[test]
fn test_help_lists_commands() {
    let temp = workspace();
    survose(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("normalize"));
}

#[test]
fn test_version_output() {
    let temp = workspace();
    survose(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("survose"));
}

#[test]
fn test_script_text_output_reports_skips_on_stderr() {
    let temp = workspace();
    fs::write(temp.path().join("survey.json"), SURVEY).unwrap();

    survose(temp.path())
        .args(["script", "survey.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "This is a open-ended question.\nHow was your ride?",
        ))
        .stdout(predicate::str::contains("Range: 1 to 5"))
        .stderr(predicate::str::contains("Skipped question 2"));
}

#[test]
fn test_script_json_output() {
    let temp = workspace();
    fs::write(temp.path().join("survey.json"), SURVEY).unwrap();

    let output = survose(temp.path())
        .args(["script", "survey.json", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["title"], "Bike Rental Feedback");
    assert_eq!(
        value["questionJson"]["Bike Rental Feedback"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
    assert_eq!(value["skipped"][0]["index"], 2);
}

#[test]
fn test_script_reads_stdin() {
    let temp = workspace();
    survose(temp.path())
        .args(["script", "-"])
        .write_stdin(r#"{"questions": [{"text": "Any comments?", "type": "open_ended"}]}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Any comments?"));
}

#[test]
fn test_normalize_repairs_survey() {
    let temp = workspace();
    fs::write(
        temp.path().join("draft.json"),
        r#"{"questions": ["How satisfied are you?", {"text": "Rate", "type": "scale", "options": {"min": "5", "max": "1"}}]}"#,
    )
    .unwrap();

    let output = survose(temp.path())
        .args(["normalize", "draft.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["title"], "Untitled Survey");
    assert_eq!(value["questions"][0]["id"], "q0");
    assert_eq!(value["questions"][0]["type"], "open_ended");
    assert_eq!(value["questions"][1]["id"], "q1");
    assert_eq!(value["questions"][1]["options"]["min"], 1);
    assert_eq!(value["questions"][1]["options"]["max"], 10);
}

#[test]
fn test_out_flag_writes_file() {
    let temp = workspace();
    fs::write(temp.path().join("survey.json"), SURVEY).unwrap();

    survose(temp.path())
        .args(["normalize", "survey.json", "--out", "normalized.json"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(temp.path().join("normalized.json")).unwrap();
    let value: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["questions"].as_array().unwrap().len(), 3);
}

#[test]
fn test_offline_commands_ignore_missing_api_key() {
    let temp = workspace();
    fs::write(temp.path().join("survey.json"), SURVEY).unwrap();

    survose(temp.path())
        .args(["--verbose", "script", "survey.json"])
        .assert()
        .success();
}

#[test]
fn test_analyze_text_and_json_output() {
    let temp = workspace();
    fs::write(temp.path().join("survey.json"), SURVEY).unwrap();
    fs::write(
        temp.path().join("responses.json"),
        r#"{"responses": [
            {"completed": true, "answers": ["Smooth", 5]},
            {"completed": true, "answers": ["Smooth"]},
            {"completed": false, "answers": []},
            {"completed": false, "answers": ["Bumpy", 3]}
        ]}"#,
    )
    .unwrap();

    survose(temp.path())
        .args(["analyze", "survey.json", "responses.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Response summary for Bike Rental Feedback"))
        .stdout(predicate::str::contains("Responses: 4 (2 completed, 50% completion rate)"))
        .stdout(predicate::str::contains("   Smooth: 2 (50%)"))
        .stdout(predicate::str::contains("   (skipped): 2 (50%)"));

    let output = survose(temp.path())
        .args(["analyze", "survey.json", "responses.json", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["responseCount"], 4);
    assert_eq!(value["completionRate"], 50);
    assert_eq!(value["distributions"].as_array().unwrap().len(), 3);
    assert_eq!(value["distributions"][1]["entries"][0]["label"], "5");
    assert_eq!(value["distributions"][2]["entries"][0]["label"], "(skipped)");
    assert_eq!(value["distributions"][2]["entries"][0]["pct"], 100);
}

#[test]
fn test_analyze_with_no_responses() {
    let temp = workspace();
    fs::write(temp.path().join("survey.json"), SURVEY).unwrap();
    fs::write(temp.path().join("responses.json"), "[]").unwrap();

    survose(temp.path())
        .args(["analyze", "survey.json", "responses.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Responses: 0 (0 completed, 0% completion rate)"))
        .stdout(predicate::str::contains("(no responses)"));
}
