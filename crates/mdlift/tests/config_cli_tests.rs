//! Integration tests for `mdlift init`, `mdlift config`, and
//! `mdlift test-upload`.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

struct TestContext {
    #[allow(dead_code)]
    temp_dir: TempDir,
    vault_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let vault_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            vault_path,
        }
    }

    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        Command::new(assert_cmd::cargo::cargo_bin!("mdlift"))
            .current_dir(&self.vault_path)
            .args(args)
            .assert()
    }

    fn write_file(&self, rel: &str, content: &str) {
        let path = self.vault_path.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

#[test]
fn test_init_creates_config_file() {
    let ctx = TestContext::new();

    ctx.run(&["init"])
        .success()
        .stdout(predicate::str::contains("Initialized config"));

    assert!(ctx.vault_path.join(".mdlift/config.toml").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["init"])
        .success()
        .stdout(predicate::str::contains("Config already exists"));
}

#[test]
fn test_config_show_defaults() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["config", "show"])
        .success()
        .stdout(predicate::str::contains("upload_service"))
        .stdout(predicate::str::contains("uPic"))
        .stdout(predicate::str::contains(".png"))
        .stdout(predicate::str::contains("delete_source_file   false"))
        .stdout(predicate::str::contains("auto_upload_on_save  false"));
}

#[test]
fn test_config_set_round_trips() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["config", "set", "upload_file_format", ".png,.webp"])
        .success();
    ctx.run(&["config", "set", "delete_source_file", "true"])
        .success();

    ctx.run(&["config", "show"])
        .success()
        .stdout(predicate::str::contains(".png,.webp"))
        .stdout(predicate::str::contains("delete_source_file   true"));
}

#[test]
fn test_config_set_preset_pins_command() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["config", "set", "upload_service", "Picsee"])
        .success();

    ctx.run(&["config", "show"])
        .success()
        .stdout(predicate::str::contains("Picsee"));
}

#[test]
fn test_config_set_unknown_key_exits_invalid() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["config", "set", "no_such_key", "x"])
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Unknown setting"));
}

#[test]
fn test_config_set_unknown_service_exits_invalid() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["config", "set", "upload_service", "imgurx"])
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Unknown upload service"));
}

#[test]
fn test_config_set_bad_boolean_exits_invalid() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["config", "set", "auto_upload_on_save", "yes"])
        .failure()
        .code(2)
        .stderr(predicate::str::contains("expected true or false"));
}

#[test]
fn test_config_show_json_envelope() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    let output = Command::new(assert_cmd::cargo::cargo_bin!("mdlift"))
        .current_dir(&ctx.vault_path)
        .args(["config", "show", "--json"])
        .output()
        .expect("run mdlift");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse JSON output");
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["upload_service"], "uPic");
    assert_eq!(json["data"]["delete_source_file"], false);
}

#[test]
fn test_test_upload_without_file_exits_invalid() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["test-upload"])
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No test file given"));
}

#[test]
fn test_test_upload_missing_file_exits_not_found() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();

    ctx.run(&["test-upload", "img/absent.png"])
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Test file not found"));
}

#[test]
fn test_test_upload_success() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();
    ctx.run(&["config", "set", "upload_service", "custom"])
        .success();
    ctx.run(&[
        "config",
        "set",
        "upload_command",
        "echo ok https://cdn.example.com/out.png # %s",
    ])
    .success();
    ctx.write_file("img/sample.png", "png-bytes");

    ctx.run(&["test-upload", "img/sample.png"])
        .success()
        .stdout(predicate::str::contains("Upload ok"))
        .stdout(predicate::str::contains("https://cdn.example.com/out.png"));
}

#[test]
fn test_test_upload_failure_exits_external_error() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();
    ctx.run(&["config", "set", "upload_service", "custom"])
        .success();
    ctx.run(&["config", "set", "upload_command", "exit 7 # %s"])
        .success();
    ctx.write_file("img/sample.png", "png-bytes");

    ctx.run(&["test-upload", "img/sample.png"])
        .failure()
        .code(10)
        .stderr(predicate::str::contains("Upload test failed"));
}

#[test]
fn test_test_upload_uses_configured_test_file_path() {
    let ctx = TestContext::new();
    ctx.run(&["init"]).success();
    ctx.run(&["config", "set", "upload_service", "custom"])
        .success();
    ctx.run(&[
        "config",
        "set",
        "upload_command",
        "echo ok https://cdn.example.com/out.png # %s",
    ])
    .success();
    ctx.write_file("img/sample.png", "png-bytes");
    ctx.run(&["config", "set", "test_file_path", "img/sample.png"])
        .success();

    ctx.run(&["test-upload"])
        .success()
        .stdout(predicate::str::contains("Upload ok"));
}
