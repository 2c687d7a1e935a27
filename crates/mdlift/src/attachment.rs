//! Attachment parsing and existence classification.
//!
//! Turns raw scanned reference strings into structured [`Attachment`]
//! records, resolving each target against the vault index and
//! classifying it as network, local, or missing.

use crate::scanner;
use crate::vault::VaultIndex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Existence classification of a reference target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceState {
    /// Target begins with an http/https scheme.
    Network,
    /// Target resolves to an entry in the vault index.
    Local,
    /// Target is neither remote nor present in the vault.
    Missing,
}

/// A resolved attachment reference.
///
/// One record per matched reference, recreated on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Attachment {
    /// Exact raw substring matched in the document. This is the key used
    /// for verbatim substitution later and must be preserved byte-for-byte.
    pub source: String,
    /// Alt/caption text; falls back to the file stem when the syntax has none.
    pub display_name: String,
    /// File name including extension.
    pub base_name: String,
    /// File stem without extension.
    pub name: String,
    /// Extension with leading dot (e.g. `.png`), compared case-insensitively.
    /// Empty when the target has no extension.
    pub extension: String,
    /// Existence classification against the vault index.
    pub existence: ExistenceState,
    /// Normalized vault-relative path, usable to query or delete the file.
    pub vault_path: String,
    /// Filesystem path passed to the upload command. Absolute when the
    /// target was found in the vault, otherwise the normalized target.
    pub system_path: String,
}

impl Attachment {
    /// Whether this attachment's extension is in the given allow-list.
    ///
    /// The allow-list holds lower-cased dot-prefixed extensions; matching
    /// is case-insensitive on the attachment side.
    pub fn has_allowed_extension<'a, I>(&self, allowed: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        let ext = self.extension.to_lowercase();
        allowed.into_iter().any(|a| *a == ext)
    }
}

/// Resolves raw reference matches against a vault index.
pub struct Resolver<'a, I: VaultIndex> {
    index: &'a I,
    vault_root: PathBuf,
}

impl<'a, I: VaultIndex> Resolver<'a, I> {
    /// Create a resolver for the given index and vault root.
    pub fn new(index: &'a I, vault_root: impl Into<PathBuf>) -> Self {
        Self {
            index,
            vault_root: vault_root.into(),
        }
    }

    /// Scan document text and resolve every reference in it.
    ///
    /// Malformed matches are silently dropped: they are not attachments,
    /// not errors to surface to the user.
    pub fn resolve_all(&self, text: &str) -> Vec<Attachment> {
        scanner::scan(text)
            .iter()
            .filter_map(|raw| self.resolve(raw))
            .collect()
    }

    /// Resolve a single raw reference match.
    ///
    /// Returns `None` when no target segment can be extracted.
    pub fn resolve(&self, raw: &str) -> Option<Attachment> {
        let (target, alt) = extract_target(raw)?;
        if target.is_empty() {
            return None;
        }

        let decoded = percent_decode(&target);
        let normalized = normalize_path(&decoded);

        let file_path = Path::new(&normalized);
        let base_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = file_path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = file_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        // Exact full-path match wins; bare file-name match is the
        // fallback because references are frequently written as bare
        // names rather than full vault paths.
        let entry = self
            .index
            .files()
            .into_iter()
            .find(|f| f.path.to_lowercase() == normalized.to_lowercase())
            .or_else(|| {
                self.index
                    .files()
                    .into_iter()
                    .find(|f| f.name.to_lowercase() == base_name.to_lowercase())
            });

        // Network is decided on the pre-decode target and is definitive:
        // remote targets are never locally present, so the index lookup
        // result is irrelevant for them.
        let existence = if target.starts_with("http://") || target.starts_with("https://") {
            ExistenceState::Network
        } else if entry.is_some() {
            ExistenceState::Local
        } else {
            ExistenceState::Missing
        };

        let (vault_path, system_path) = match &entry {
            Some(file) => (
                file.path.clone(),
                self.vault_root.join(&file.path).to_string_lossy().to_string(),
            ),
            None => (normalized.clone(), normalized.clone()),
        };

        Some(Attachment {
            source: raw.to_string(),
            display_name: alt.unwrap_or_else(|| name.clone()),
            base_name,
            name,
            extension,
            existence,
            vault_path,
            system_path,
        })
    }
}

/// Extract the target segment (and alt text, for `![alt](target)`) from
/// a raw match.
fn extract_target(raw: &str) -> Option<(String, Option<String>)> {
    if let Some(inner) = raw.strip_prefix("![[").and_then(|r| r.strip_suffix("]]")) {
        return Some((inner.to_string(), None));
    }

    if raw.contains('(') && raw.contains(')') {
        let target_pattern = regex::Regex::new(r"\((.*?)\)").unwrap();
        let alt_pattern = regex::Regex::new(r"\[(.*?)\]").unwrap();

        let target = target_pattern.captures(raw)?.get(1)?.as_str().to_string();
        let alt = alt_pattern
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|a| !a.is_empty());
        return Some((target, alt));
    }

    None
}

/// Percent-decode a reference target, falling back to the raw string
/// when the encoding is invalid.
pub fn percent_decode(target: &str) -> String {
    urlencoding::decode(target)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| target.to_string())
}

/// Normalize path separators and resolve `.` / `..` components.
///
/// Backslashes become forward slashes, leading and trailing separators
/// are dropped, and parent components pop their predecessor. The
/// operation is idempotent: normalizing an already-normalized path is a
/// no-op.
pub fn normalize_path(path: &str) -> String {
    let cleaned = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for part in cleaned.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    parts.join("/")
}
