//! Vault file index and document access abstractions.
//!
//! This module defines the narrow capability traits the engine consumes:
//! `VaultIndex` for file existence queries and deletion, and
//! `TextDocument` for reading and rewriting document text. Filesystem
//! implementations back the CLI; in-memory implementations back tests so
//! the core has zero host dependency.

use anyhow::{anyhow, Context, Result};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A file known to the vault index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFile {
    /// Vault-relative path with `/` separators.
    pub path: String,
    /// File name including extension.
    pub name: String,
}

impl VaultFile {
    /// Build a vault file entry from its vault-relative path.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { path, name }
    }
}

/// Trait for vault file indexes.
///
/// Abstracts the host's file index so the resolver and orchestrator can
/// be exercised against an in-memory fake. Implementations must be
/// `Clone` to support shared access patterns.
pub trait VaultIndex: Clone {
    /// List every file in the vault.
    fn files(&self) -> Vec<VaultFile>;

    /// Look up a file by its exact vault-relative path.
    ///
    /// Returns `None` when no such file exists.
    fn get_by_path(&self, path: &str) -> Option<VaultFile>;

    /// Delete a file from the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be removed.
    fn delete(&self, path: &str) -> Result<()>;
}

/// Filesystem-backed vault index.
///
/// Walks the vault root recursively, skipping dot-directories (the
/// vault's own configuration directory included).
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Create an index over the given vault root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The vault root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect_files(&self, dir: &Path, out: &mut Vec<VaultFile>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                self.collect_files(&path, out);
            } else if let Ok(rel) = path.strip_prefix(&self.root) {
                let rel = rel.to_string_lossy().replace('\\', "/");
                out.push(VaultFile {
                    path: rel,
                    name: file_name,
                });
            }
        }
    }
}

impl VaultIndex for FsVault {
    fn files(&self) -> Vec<VaultFile> {
        let mut out = Vec::new();
        self.collect_files(&self.root, &mut out);
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out
    }

    fn get_by_path(&self, path: &str) -> Option<VaultFile> {
        let full = self.root.join(path);
        if full.is_file() {
            Some(VaultFile::from_path(path))
        } else {
            None
        }
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full = self.root.join(path);
        fs::remove_file(&full)
            .with_context(|| format!("Failed to delete vault file: {}", full.display()))
    }
}

/// In-memory vault index for testing.
///
/// Uses `Rc<RefCell<>>` for shared interior mutability - clones share
/// the same file set, so deletions made through the orchestrator are
/// visible to the test that constructed the index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVault {
    paths: Rc<RefCell<BTreeSet<String>>>,
}

impl InMemoryVault {
    /// Create an empty in-memory vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vault indexing the given vault-relative paths.
    pub fn with_files<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vault = Self::new();
        for path in paths {
            vault.paths.borrow_mut().insert(path.into());
        }
        vault
    }

    /// Whether the vault still contains the given path.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.borrow().contains(path)
    }
}

impl VaultIndex for InMemoryVault {
    fn files(&self) -> Vec<VaultFile> {
        self.paths
            .borrow()
            .iter()
            .map(|p| VaultFile::from_path(p.clone()))
            .collect()
    }

    fn get_by_path(&self, path: &str) -> Option<VaultFile> {
        if self.paths.borrow().contains(path) {
            Some(VaultFile::from_path(path))
        } else {
            None
        }
    }

    fn delete(&self, path: &str) -> Result<()> {
        if self.paths.borrow_mut().remove(path) {
            Ok(())
        } else {
            Err(anyhow!("File not found in vault: {}", path))
        }
    }
}

/// Trait for documents whose text can be read and rewritten.
///
/// The orchestrator mutates documents by full replace-and-reassign
/// between attachments, so implementations only need whole-text access.
pub trait TextDocument {
    /// Identifier used in notices (typically the file name).
    fn name(&self) -> &str;

    /// Read the full document text.
    fn text(&self) -> Result<String>;

    /// Replace the full document text.
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// Filesystem-backed document.
#[derive(Debug)]
pub struct FsDocument {
    path: PathBuf,
    name: String,
}

impl FsDocument {
    /// Open a document at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not point to an existing file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(anyhow!("Document not found: {}", path.display()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { path, name })
    }
}

impl TextDocument for FsDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn text(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read document: {}", self.path.display()))
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to write document: {}", self.path.display()))
    }
}

/// In-memory document for testing.
#[derive(Debug, Clone)]
pub struct BufferDocument {
    name: String,
    content: String,
}

impl BufferDocument {
    /// Create a named in-memory document with the given content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// The current document content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl TextDocument for BufferDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn text(&self) -> Result<String> {
        Ok(self.content.clone())
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.content = text.to_string();
        Ok(())
    }
}
