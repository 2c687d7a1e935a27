//! Command-line interface definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mdlift - markdown attachment uploader
///
/// Scans markdown documents for local attachment references, uploads the
/// attachments through a configured external command, and rewrites the
/// references to the returned URLs.
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred
///   2  - Invalid arguments or usage error
///   3  - Resource not found (document, vault file)
///   5  - Permission denied
///  10  - External dependency failed (upload command, file system)
#[derive(Parser)]
#[command(name = "mdlift")]
#[command(about = "Markdown attachment uploader", long_about = None)]
pub struct Cli {
    /// Suppress non-essential output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Vault root directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file into the vault
    Init,

    /// Upload every eligible attachment referenced by a document
    ///
    /// Eligible attachments resolve to a file in the vault and carry an
    /// extension from the accepted-format set. Each attachment is
    /// uploaded sequentially; the document is rewritten in place after
    /// every successful upload.
    Upload {
        /// Markdown document to process (vault-relative or absolute)
        document: PathBuf,

        /// Emit a machine-readable JSON report
        #[arg(long)]
        json: bool,
    },

    /// Upload a just-saved attachment and rewrite references to it
    ///
    /// Requires auto_upload_on_save. Every markdown document in the
    /// vault counts as an open view for rewrite propagation.
    Saved {
        /// Attachment file that was saved (vault-relative or absolute)
        file: String,

        /// Emit a machine-readable JSON report
        #[arg(long)]
        json: bool,
    },

    /// Watch the vault and auto-upload saved attachments
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value_t = 2)]
        interval: u64,

        /// Poll a single time and exit (for scripting)
        #[arg(long)]
        once: bool,
    },

    /// Run one upload and show the result
    TestUpload {
        /// File to upload (defaults to the configured test_file_path)
        path: Option<String>,

        /// Emit the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Emit settings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update one setting and persist it
    ///
    /// Keys: upload_service, upload_command, upload_file_format,
    /// delete_source_file, auto_upload_on_save, test_file_path
    Set {
        /// Setting name
        key: String,
        /// New value (formats are given comma-delimited)
        value: String,
    },
}
