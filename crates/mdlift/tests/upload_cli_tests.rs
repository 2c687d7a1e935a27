//! Integration tests for the `mdlift upload` command.
//!
//! Cover the full upload-and-replace lifecycle against a real vault on
//! disk, with the external upload command scripted through `sh`:
//! 1. Eligible local attachments are uploaded and references rewritten
//! 2. Documents without eligible attachments are left untouched
//! 3. Upload failures leave the document unchanged and exit 0
//! 4. delete_source_file removes the local file after upload
//! 5. JSON output envelope
//! 6. Exit codes for missing documents and misconfigured commands

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
        let ctx = Self {
            temp_dir,
            vault_path,
        };
        ctx.run(&["init"]).success();
        ctx
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

    fn read_file(&self, rel: &str) -> String {
        fs::read_to_string(self.vault_path.join(rel)).unwrap()
    }

    fn set(&self, key: &str, value: &str) {
        self.run(&["config", "set", key, value]).success();
    }

    /// Point the upload command at a shell snippet that ignores the file
    /// and prints a fixed URL.
    fn use_echo_uploader(&self) {
        self.set("upload_service", "custom");
        self.set(
            "upload_command",
            "echo ok https://cdn.example.com/out.png # %s",
        );
    }

    /// Point the upload command at a shell snippet that always fails.
    fn use_failing_uploader(&self) {
        self.set("upload_service", "custom");
        self.set("upload_command", "echo broken upload >&2; exit 3 # %s");
    }
}

#[test]
fn test_upload_rewrites_local_reference() {
    let ctx = TestContext::new();
    ctx.use_echo_uploader();
    ctx.write_file("img/photo.png", "png-bytes");
    ctx.write_file("note.md", "intro\n![photo](img/photo.png)\noutro\n");

    ctx.run(&["upload", "note.md"])
        .success()
        .stdout(predicate::str::contains("matched the upload conditions"))
        .stdout(predicate::str::contains("Uploaded attachment: img/photo.png"))
        .stdout(predicate::str::contains(
            "Replaced with: https://cdn.example.com/out.png",
        ));

    let text = ctx.read_file("note.md");
    assert!(text.contains("![photo](https://cdn.example.com/out.png)"));
    assert!(!text.contains("img/photo.png"));
    // Source file stays by default.
    assert!(ctx.vault_path.join("img/photo.png").is_file());
}

#[test]
fn test_upload_rewrites_wiki_reference() {
    let ctx = TestContext::new();
    ctx.use_echo_uploader();
    ctx.write_file("img/photo.png", "png-bytes");
    ctx.write_file("note.md", "![[img/photo.png]]\n");

    ctx.run(&["upload", "note.md"]).success();

    let text = ctx.read_file("note.md");
    assert_eq!(text, "![photo](https://cdn.example.com/out.png)\n");
}

#[test]
fn test_upload_without_eligible_attachments_reports_and_leaves_document() {
    let ctx = TestContext::new();
    ctx.use_echo_uploader();
    let original = "remote ![pic](https://already.example.com/pic.png)\nand ![gone](img/gone.png)\n";
    ctx.write_file("note.md", original);

    ctx.run(&["upload", "note.md"])
        .success()
        .stdout(predicate::str::contains(
            "No local attachment matching the upload conditions was found.",
        ));

    assert_eq!(ctx.read_file("note.md"), original);
}

#[test]
fn test_upload_skips_extensions_outside_accept_list() {
    let ctx = TestContext::new();
    ctx.use_echo_uploader();
    ctx.set("upload_file_format", ".png");
    ctx.write_file("img/photo.gif", "gif-bytes");
    let original = "![photo](img/photo.gif)\n";
    ctx.write_file("note.md", original);

    ctx.run(&["upload", "note.md"]).success().stdout(
        predicate::str::contains("No local attachment matching the upload conditions was found."),
    );

    assert_eq!(ctx.read_file("note.md"), original);
}

#[test]
fn test_upload_failure_leaves_document_and_exits_zero() {
    let ctx = TestContext::new();
    ctx.use_failing_uploader();
    ctx.write_file("img/photo.png", "png-bytes");
    let original = "![photo](img/photo.png)\n";
    ctx.write_file("note.md", original);

    ctx.run(&["upload", "note.md"])
        .success()
        .stdout(predicate::str::contains("Upload failed: img/photo.png"))
        .stdout(predicate::str::contains("broken upload"));

    assert_eq!(ctx.read_file("note.md"), original);
    assert!(ctx.vault_path.join("img/photo.png").is_file());
}

#[test]
fn test_upload_deletes_source_when_configured() {
    let ctx = TestContext::new();
    ctx.use_echo_uploader();
    ctx.set("delete_source_file", "true");
    ctx.write_file("img/photo.png", "png-bytes");
    ctx.write_file("note.md", "![photo](img/photo.png)\n");

    ctx.run(&["upload", "note.md"])
        .success()
        .stdout(predicate::str::contains(
            "Local attachment deleted: img/photo.png",
        ));

    assert!(!ctx.vault_path.join("img/photo.png").exists());
    assert!(ctx
        .read_file("note.md")
        .contains("https://cdn.example.com/out.png"));
}

#[test]
fn test_upload_json_envelope() {
    let ctx = TestContext::new();
    ctx.use_echo_uploader();
    ctx.write_file("img/photo.png", "png-bytes");
    ctx.write_file("note.md", "![photo](img/photo.png)\n");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("mdlift"))
        .current_dir(&ctx.vault_path)
        .args(["upload", "note.md", "--json"])
        .output()
        .expect("run mdlift");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse JSON output");
    assert_eq!(json["success"], true);
    assert_eq!(json["metadata"]["command"], "upload");
    assert_eq!(json["data"]["scanned"], 1);
    assert_eq!(json["data"]["eligible"], 1);
    assert_eq!(json["data"]["uploaded"], 1);
    assert_eq!(json["data"]["failed"], 0);
    assert_eq!(json["data"]["outcomes"][0]["status"], "uploaded");
    assert_eq!(json["data"]["outcomes"][0]["vault_path"], "img/photo.png");
    assert_eq!(
        json["data"]["outcomes"][0]["url"],
        "https://cdn.example.com/out.png"
    );
}

#[test]
fn test_upload_missing_document_exits_not_found() {
    let ctx = TestContext::new();
    ctx.use_echo_uploader();

    ctx.run(&["upload", "absent.md"])
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn test_upload_command_without_placeholder_exits_invalid() {
    let ctx = TestContext::new();
    ctx.set("upload_service", "custom");
    ctx.set("upload_command", "mytool --upload");
    ctx.write_file("note.md", "plain text\n");

    ctx.run(&["upload", "note.md"])
        .failure()
        .code(2)
        .stderr(predicate::str::contains("no %s placeholder"));
}

#[test]
fn test_upload_duplicate_references_both_rewritten() {
    let ctx = TestContext::new();
    ctx.use_echo_uploader();
    ctx.write_file("img/photo.png", "png-bytes");
    ctx.write_file(
        "note.md",
        "![photo](img/photo.png)\nagain ![photo](img/photo.png)\n",
    );

    ctx.run(&["upload", "note.md"]).success();

    let text = ctx.read_file("note.md");
    assert_eq!(text.matches("https://cdn.example.com/out.png").count(), 2);
    assert!(!text.contains("img/photo.png"));
}
