//! Upload command execution and output parsing.
//!
//! Runs the configured external upload command for a resolved local
//! path and parses its standard output into an upload outcome. The
//! command template contains a single `%s` placeholder which receives
//! the shell-escaped file path.
//!
//! Uploads are bounded only by the external process: there is no
//! timeout, so a hanging command stalls the caller indefinitely.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};

/// Captured result of running a shell command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited successfully.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for command execution backends.
///
/// Abstracts process spawning so the gateway can be exercised with a
/// scripted fake in tests.
pub trait CommandRunner {
    /// Run a shell command and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be spawned at all.
    fn run(&self, command: &str) -> Result<CommandOutput>;
}

/// Command runner backed by the system shell.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        #[cfg(unix)]
        let mut cmd = {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        };

        #[cfg(windows)]
        let mut cmd = {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        };

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .context("Failed to spawn upload command")?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Outcome of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The command ran and printed a recognizable URL.
    Uploaded { url: String },
    /// The command failed, or ran without printing a URL.
    Failed { message: String },
}

impl UploadOutcome {
    /// Whether the upload produced a URL.
    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }
}

/// Invokes the external upload command and parses its output.
pub struct UploadGateway<R: CommandRunner> {
    command_template: String,
    runner: R,
}

impl<R: CommandRunner> UploadGateway<R> {
    /// Create a gateway for the given command template.
    ///
    /// The template must contain a `%s` placeholder for the file path.
    pub fn new(command_template: impl Into<String>, runner: R) -> Self {
        Self {
            command_template: command_template.into(),
            runner,
        }
    }

    /// Upload the file at the given path.
    ///
    /// The path is quoted (inner quotes escaped) and substituted at the
    /// template's `%s` placeholder. On process success the first
    /// whitespace-preceded `http(s)://` URL in stdout is percent-decoded
    /// and returned; output with no recognizable URL is a failure
    /// carrying the raw output (a configuration error, not a crash).
    /// Process failure yields a failure with the process's description.
    pub fn upload(&self, path: &str) -> UploadOutcome {
        let escaped = format!("\"{}\"", path.replace('"', "\\\""));
        let command = self.command_template.replace("%s", &escaped);

        let output = match self.runner.run(&command) {
            Ok(output) => output,
            Err(e) => {
                return UploadOutcome::Failed {
                    message: format!("{:#}", e),
                }
            }
        };

        if !output.success() {
            let message = if output.stderr.trim().is_empty() {
                match output.exit_code {
                    Some(code) => format!("Upload command exited with status {}", code),
                    None => "Upload command terminated by signal".to_string(),
                }
            } else {
                output.stderr.trim().to_string()
            };
            return UploadOutcome::Failed { message };
        }

        match extract_url(&output.stdout) {
            Some(url) => UploadOutcome::Uploaded { url },
            None => UploadOutcome::Failed {
                message: output.stdout,
            },
        }
    }
}

/// Find the first whitespace-preceded URL in command output.
fn extract_url(stdout: &str) -> Option<String> {
    let url_pattern = regex::Regex::new(r"\s(https?://\S+)").unwrap();
    url_pattern
        .captures(stdout)
        .and_then(|cap| cap.get(1))
        .map(|m| crate::attachment::percent_decode(m.as_str()))
}
