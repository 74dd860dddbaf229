//! Smoke tests for the bamboo binary
//!
//! These run the compiled binary with `assert_cmd` inside a temporary
//! directory. None of them reach the generation service.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn bamboo_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bamboo"));
    cmd.current_dir(dir.path())
        .env("BAMBOO_HOME", dir.path().join("home"))
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    cmd
}

fn write_config(dir: &TempDir, body: &str) {
    let cfg = dir.path().join(".bamboo");
    fs::create_dir_all(&cfg).unwrap();
    fs::write(cfg.join("config.toml"), body).unwrap();
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    bamboo_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("intercept"))
        .stdout(predicate::str::contains("console"));
}

#[test]
fn config_json_reports_sources() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[simulation]\nfeed_batch = 6\n");

    let output = bamboo_cmd(&dir)
        .args(["config", "--json", "--model", "gemini-cli-model"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["values"]["llm_model"]["value"], "gemini-cli-model");
    assert_eq!(value["values"]["llm_model"]["source"], "cli");
    assert_eq!(value["values"]["simulation_feed_batch"]["value"], "6");
    assert_eq!(value["values"]["simulation_feed_batch"]["source"], "config");
    assert_eq!(value["values"]["retry_max_retries"]["source"], "default");
}

#[test]
fn invalid_config_exits_with_cli_args_code() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[simulation]\nemergency = \"zombies\"\n");

    bamboo_cmd(&dir)
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("simulation.emergency"));
}

#[test]
fn unknown_config_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[llm]\nprovidr = \"gemini\"\n");

    bamboo_cmd(&dir).arg("config").assert().code(2);
}

#[test]
fn missing_api_key_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[llm]\napi_key_env = \"BAMBOO_SMOKE_UNSET_KEY\"\n");

    bamboo_cmd(&dir)
        .env_remove("BAMBOO_SMOKE_UNSET_KEY")
        .args(["feed", "--count", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("BAMBOO_SMOKE_UNSET_KEY"));
}

#[test]
fn console_quits_on_end_of_input() {
    let dir = TempDir::new().unwrap();
    bamboo_cmd(&dir)
        .env("GEMINI_API_KEY", "smoke-test-key")
        .arg("console")
        .assert()
        .success()
        .stdout(predicate::str::contains("bamboo 운영자 콘솔"));
}
