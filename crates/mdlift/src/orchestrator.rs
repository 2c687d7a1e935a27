//! Upload orchestration.
//!
//! Composes the scanner, resolver, gateway, and rewrite engine into the
//! per-document upload lifecycle: scan, filter by eligibility, upload
//! each attachment sequentially, rewrite the document, optionally delete
//! the source file, and report every outcome individually.
//!
//! Attachments are processed strictly one at a time. The document is
//! mutated by full replace-and-reassign between attachments, and the
//! external upload command may not be reentrant-safe, so neither step
//! is parallelized. There is no cancellation: a hanging upload command
//! stalls the remainder of the batch.

use crate::attachment::{Attachment, ExistenceState, Resolver};
use crate::config::Settings;
use crate::gateway::{CommandRunner, UploadGateway, UploadOutcome};
use crate::output::Notifier;
use crate::rewrite;
use crate::vault::{TextDocument, VaultIndex};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of processing one attachment in a batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AttachmentOutcome {
    /// Vault-relative path of the attachment.
    pub vault_path: String,
    /// Upload result for this attachment.
    #[serde(flatten)]
    pub outcome: UploadOutcome,
    /// Whether the local source file was deleted after the upload.
    pub source_deleted: bool,
}

/// Summary of one orchestration batch over a document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadReport {
    /// Unique id for this batch run.
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// References that resolved to attachments.
    pub scanned: usize,
    /// Attachments that passed the eligibility filter.
    pub eligible: usize,
    pub uploaded: usize,
    pub failed: usize,
    pub outcomes: Vec<AttachmentOutcome>,
}

/// Summary of a save-triggered upload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SavedUploadReport {
    /// Vault-relative path of the uploaded file.
    pub file: String,
    #[serde(flatten)]
    pub outcome: UploadOutcome,
    /// Open documents whose text was rewritten.
    pub views_updated: usize,
}

/// Drives the upload-and-replace lifecycle for a document.
///
/// Settings are threaded in at construction time; nothing here touches
/// process-wide state. One orchestrator batch is expected to run against
/// a given document at a time.
pub struct UploadOrchestrator<'a, I: VaultIndex, R: CommandRunner> {
    settings: &'a Settings,
    index: &'a I,
    vault_root: PathBuf,
    gateway: UploadGateway<R>,
    notifier: &'a dyn Notifier,
}

impl<'a, I: VaultIndex, R: CommandRunner> UploadOrchestrator<'a, I, R> {
    /// Create an orchestrator over the given vault.
    pub fn new(
        settings: &'a Settings,
        index: &'a I,
        vault_root: impl Into<PathBuf>,
        runner: R,
        notifier: &'a dyn Notifier,
    ) -> Self {
        let gateway = UploadGateway::new(settings.effective_command(), runner);
        Self {
            settings,
            index,
            vault_root: vault_root.into(),
            gateway,
            notifier,
        }
    }

    /// Upload every eligible attachment referenced by the document.
    ///
    /// Eligible means: resolved as [`ExistenceState::Local`] with an
    /// extension in the accepted-format set. An empty eligible set is a
    /// terminal non-error. One attachment's failure never aborts the
    /// batch; each outcome is reported individually as it happens.
    pub fn upload_document(&self, doc: &mut impl TextDocument) -> Result<UploadReport> {
        let started_at = Utc::now();
        let resolver = Resolver::new(self.index, &self.vault_root);

        let text = doc.text()?;
        let attachments = resolver.resolve_all(&text);
        let scanned = attachments.len();

        let eligible: Vec<Attachment> = attachments
            .into_iter()
            .filter(|a| {
                a.existence == ExistenceState::Local
                    && a.has_allowed_extension(&self.settings.upload_file_format)
            })
            .collect();

        if eligible.is_empty() {
            self.notifier
                .notify("No local attachment matching the upload conditions was found.");
            return Ok(self.report(started_at, scanned, Vec::new()));
        }

        self.notifier.notify(&format!(
            "{} attachment(s) matched the upload conditions, uploading and replacing...",
            eligible.len()
        ));

        let mut outcomes = Vec::with_capacity(eligible.len());
        for attachment in &eligible {
            outcomes.push(self.process_attachment(doc, attachment)?);
        }

        Ok(self.report(started_at, scanned, outcomes))
    }

    /// Upload one attachment and rewrite the document on success.
    fn process_attachment(
        &self,
        doc: &mut impl TextDocument,
        attachment: &Attachment,
    ) -> Result<AttachmentOutcome> {
        let outcome = self.gateway.upload(&attachment.system_path);
        let mut source_deleted = false;

        match &outcome {
            UploadOutcome::Uploaded { url } => {
                let current = doc.text()?;
                let replacement = rewrite::build_replacement(attachment, url);
                doc.set_text(&rewrite::apply_replacement(&current, attachment, &replacement))?;
                self.notifier.notify(&format!(
                    "Uploaded attachment: {}\nReplaced with: {}",
                    attachment.vault_path, url
                ));

                // Deletion is attempted only when the source is still a
                // known vault entry.
                if self.settings.delete_source_file
                    && self.index.get_by_path(&attachment.vault_path).is_some()
                {
                    match self.index.delete(&attachment.vault_path) {
                        Ok(()) => {
                            source_deleted = true;
                            self.notifier.notify(&format!(
                                "Local attachment deleted: {}",
                                attachment.vault_path
                            ));
                        }
                        Err(e) => self.notifier.notify(&format!(
                            "Failed to delete local attachment {}: {:#}",
                            attachment.vault_path, e
                        )),
                    }
                }
            }
            UploadOutcome::Failed { message } => {
                self.notifier.notify(&format!(
                    "Upload failed: {}\n\nError message:\n{}",
                    attachment.vault_path, message
                ));
            }
        }

        Ok(AttachmentOutcome {
            vault_path: attachment.vault_path.clone(),
            outcome,
            source_deleted,
        })
    }

    /// Upload a just-saved attachment file and propagate the rewrite
    /// into every open document view referencing it.
    ///
    /// Callers gate this on `auto_upload_on_save` and on the file's
    /// extension being uploadable; the orchestrator only requires the
    /// file to exist in the vault.
    pub fn upload_saved_file<V: TextDocument>(
        &self,
        vault_path: &str,
        views: &mut [V],
    ) -> Result<SavedUploadReport> {
        let entry = self
            .index
            .get_by_path(vault_path)
            .ok_or_else(|| anyhow!("File not found in vault: {}", vault_path))?;

        let system_path = self
            .vault_root
            .join(&entry.path)
            .to_string_lossy()
            .to_string();
        let outcome = self.gateway.upload(&system_path);

        let mut views_updated = 0;
        match &outcome {
            UploadOutcome::Uploaded { url } => {
                let resolver = Resolver::new(self.index, &self.vault_root);
                for view in views.iter_mut() {
                    if self.rewrite_view(&resolver, view, &entry.name, url)? {
                        views_updated += 1;
                    }
                }
                self.notifier
                    .notify(&format!("Auto uploaded: {}", entry.name));
            }
            UploadOutcome::Failed { message } => {
                self.notifier.notify(&format!(
                    "Upload failed: {}\n\nError message:\n{}",
                    entry.path, message
                ));
            }
        }

        Ok(SavedUploadReport {
            file: entry.path,
            outcome,
            views_updated,
        })
    }

    /// Rewrite one view's references to the named file. Returns whether
    /// the view changed.
    fn rewrite_view(
        &self,
        resolver: &Resolver<'_, I>,
        view: &mut impl TextDocument,
        file_name: &str,
        url: &str,
    ) -> Result<bool> {
        let text = view.text()?;
        let matching: Vec<Attachment> = resolver
            .resolve_all(&text)
            .into_iter()
            .filter(|a| {
                a.existence == ExistenceState::Local
                    && a.base_name.to_lowercase() == file_name.to_lowercase()
            })
            .collect();

        if matching.is_empty() {
            return Ok(false);
        }

        // Identical raw references each replace their own occurrence:
        // first-occurrence substitution walks forward through duplicates.
        let mut updated = text.clone();
        for attachment in &matching {
            let replacement = rewrite::build_replacement(attachment, url);
            updated = rewrite::apply_replacement(&updated, attachment, &replacement);
        }

        if updated != text {
            view.set_text(&updated)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Run one upload and report the result (diagnostic action).
    pub fn test_upload(&self, path: &str) -> UploadOutcome {
        let outcome = self.gateway.upload(path);
        match &outcome {
            UploadOutcome::Uploaded { url } => {
                self.notifier
                    .notify(&format!("Upload ok: {}\nURL: {}", path, url));
            }
            UploadOutcome::Failed { message } => {
                self.notifier
                    .notify(&format!("Upload failed: {}\n\nError message:\n{}", path, message));
            }
        }
        outcome
    }

    fn report(
        &self,
        started_at: DateTime<Utc>,
        scanned: usize,
        outcomes: Vec<AttachmentOutcome>,
    ) -> UploadReport {
        let uploaded = outcomes.iter().filter(|o| o.outcome.is_uploaded()).count();
        UploadReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at,
            completed_at: Utc::now(),
            scanned,
            eligible: outcomes.len(),
            uploaded,
            failed: outcomes.len() - uploaded,
            outcomes,
        }
    }
}
