//! Markdown Attachment Uploader Library
//!
//! This library provides the attachment resolution and link-rewrite
//! engine behind the mdlift CLI: scanning markdown for attachment
//! references, classifying them against a vault file index, uploading
//! local attachments through an external command, and rewriting
//! documents to use the returned URLs.

pub mod attachment;
pub mod cli;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod orchestrator;
pub mod output;
pub mod rewrite;
pub mod scanner;
pub mod vault;
pub mod watch;

// Re-export commonly used types
pub use attachment::{Attachment, ExistenceState, Resolver};
pub use config::{ConfigError, Settings};
pub use gateway::{CommandRunner, ShellRunner, UploadGateway, UploadOutcome};
pub use orchestrator::{UploadOrchestrator, UploadReport};
pub use output::{ExitCode, JsonOutput, OutputContext};
pub use vault::{FsVault, InMemoryVault, TextDocument, VaultIndex};
