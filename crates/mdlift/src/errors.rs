//! Actionable error formatting for improved user experience.
//!
//! Wraps an error message with possible causes and remediation steps so
//! configuration problems (the dominant failure mode for an external
//! upload command) tell the user how to fix them.

use std::fmt;

/// An error with diagnostic context and remediation steps.
///
/// # Example
///
/// ```
/// use mdlift::errors::ActionableError;
///
/// let error = ActionableError::new("Upload command produced no URL")
///     .with_cause("The command's output format may have changed")
///     .with_remedy("Run the command manually and check its output");
///
/// eprintln!("{}", error);
/// ```
#[derive(Debug, Clone)]
pub struct ActionableError {
    /// The main error message
    error: String,
    /// Possible causes (diagnostic hints)
    causes: Vec<String>,
    /// Remediation steps (how to fix)
    remediation: Vec<String>,
}

impl ActionableError {
    /// Create a new actionable error with the given message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            causes: Vec::new(),
            remediation: Vec::new(),
        }
    }

    /// Add a possible cause (diagnostic hint).
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Add a remediation step (actionable fix).
    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remediation.push(remedy.into());
        self
    }

    /// Convert to a formatted error message suitable for display.
    pub fn to_error_message(&self) -> String {
        let mut msg = format!("Error: {}\n", self.error);

        if !self.causes.is_empty() {
            msg.push_str("\nPossible causes:\n");
            for cause in &self.causes {
                msg.push_str(&format!("  • {}\n", cause));
            }
        }

        if !self.remediation.is_empty() {
            msg.push_str("\nTo fix:\n");
            for remedy in &self.remediation {
                msg.push_str(&format!("  • {}\n", remedy));
            }
        }

        msg
    }
}

impl fmt::Display for ActionableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_error_message())
    }
}

impl std::error::Error for ActionableError {}

/// Helper for an unset or placeholder-less upload command.
pub fn upload_command_not_configured(command: &str) -> ActionableError {
    ActionableError::new(if command.trim().is_empty() {
        "No upload command configured".to_string()
    } else {
        format!("Upload command has no %s placeholder: {}", command)
    })
    .with_cause("The upload_service may be set to custom without a command")
    .with_cause("The command template must contain %s for the file path")
    .with_remedy("Set a command: mdlift config set upload_command \"mytool -u %s\"")
    .with_remedy("Or pick a preset: mdlift config set upload_service uPic")
}

/// Helper for an upload command whose binary is not on PATH.
pub fn upload_binary_not_found(program: &str) -> ActionableError {
    ActionableError::new(format!("Upload command binary not found: {}", program))
        .with_cause("The tool may not be installed")
        .with_cause("The tool may not be on PATH or at the configured absolute path")
        .with_remedy(format!("Verify the binary location: which {}", program))
        .with_remedy("Update the command: mdlift config set upload_command \"<path> %s\"")
}

/// Helper for a missing test file in the `test-upload` diagnostic.
pub fn test_file_not_found(path: &str) -> ActionableError {
    ActionableError::new(format!("Test file not found: {}", path))
        .with_cause("test_file_path may point at a moved or deleted file")
        .with_remedy("Pass a file explicitly: mdlift test-upload <path>")
        .with_remedy("Or update it: mdlift config set test_file_path <path>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actionable_error_formatting() {
        let error = ActionableError::new("Test error")
            .with_cause("First cause")
            .with_cause("Second cause")
            .with_remedy("First remedy")
            .with_remedy("Second remedy");

        let msg = error.to_error_message();

        assert!(msg.contains("Error: Test error"));
        assert!(msg.contains("Possible causes:"));
        assert!(msg.contains("• First cause"));
        assert!(msg.contains("• Second cause"));
        assert!(msg.contains("To fix:"));
        assert!(msg.contains("• First remedy"));
        assert!(msg.contains("• Second remedy"));
    }

    #[test]
    fn test_error_without_causes() {
        let error = ActionableError::new("Simple error").with_remedy("Just fix it");

        let msg = error.to_error_message();

        assert!(msg.contains("Error: Simple error"));
        assert!(!msg.contains("Possible causes:"));
        assert!(msg.contains("To fix:"));
    }

    #[test]
    fn test_upload_command_not_configured_helper() {
        let empty = upload_command_not_configured("");
        assert!(empty.to_error_message().contains("No upload command configured"));

        let no_placeholder = upload_command_not_configured("mytool -u");
        assert!(no_placeholder
            .to_error_message()
            .contains("no %s placeholder"));
    }

    #[test]
    fn test_upload_binary_not_found_helper() {
        let error = upload_binary_not_found("uPic");
        let msg = error.to_error_message();
        assert!(msg.contains("binary not found: uPic"));
        assert!(msg.contains("which uPic"));
    }

    #[test]
    fn test_test_file_not_found_helper() {
        let error = test_file_not_found("img/sample.png");
        let msg = error.to_error_message();
        assert!(msg.contains("Test file not found: img/sample.png"));
        assert!(msg.contains("mdlift test-upload"));
    }
}
