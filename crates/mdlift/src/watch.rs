//! Attachment save watching.
//!
//! Polls the vault for new or modified attachment files so the CLI can
//! trigger the save-upload path when `auto_upload_on_save` is enabled.
//! Polling keeps the loop dependency-free and cooperative: one scan per
//! interval, uploads run to completion between scans.

use crate::config::Settings;
use crate::vault::{FsVault, VaultIndex};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Tracks attachment modification times between polls.
#[derive(Debug, Default)]
pub struct WatchState {
    mtimes: HashMap<String, SystemTime>,
}

impl WatchState {
    /// Record the current state of the vault without reporting changes.
    ///
    /// Files already present when watching starts are not treated as
    /// saves; only subsequent changes are.
    pub fn prime(root: &Path, settings: &Settings) -> Self {
        let mut state = Self::default();
        state.poll(root, settings);
        state
    }

    /// Scan the vault and return attachments saved since the last poll.
    ///
    /// A file counts as saved when it is new or its modification time
    /// moved forward. Only files whose extension is in the
    /// accepted-format set are tracked; markdown rewrites performed by
    /// the uploader itself never show up here.
    pub fn poll(&mut self, root: &Path, settings: &Settings) -> Vec<String> {
        let vault = FsVault::new(root);
        let mut changed = Vec::new();

        for file in vault.files() {
            if !settings.is_uploadable_file(&file.name) {
                continue;
            }
            let mtime = match fs::metadata(root.join(&file.path)).and_then(|m| m.modified()) {
                Ok(mtime) => mtime,
                Err(_) => continue,
            };
            match self.mtimes.get(&file.path) {
                Some(previous) if *previous >= mtime => {}
                _ => changed.push(file.path.clone()),
            }
            self.mtimes.insert(file.path, mtime);
        }

        changed.sort();
        changed
    }
}
