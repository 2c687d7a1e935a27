//! Settings loading, merging, and persistence.
//!
//! Settings live in `<vault>/.mdlift/config.toml`, with a user-level
//! fallback at `~/.config/mdlift/config.toml`. Loading merges persisted
//! overrides over defaults; missing files yield the defaults. The
//! accepted-format set is persisted as a comma-delimited string and
//! deserialized into a set of lower-cased, dot-prefixed extensions.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory under the vault root holding mdlift state.
pub const CONFIG_DIR: &str = ".mdlift";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Named upload command presets.
///
/// `custom` defers to the user-provided command template.
pub const UPLOAD_SERVICES: [&str; 3] = ["uPic", "Picsee", "custom"];

/// Look up the command template for a named upload service.
pub fn preset_command(service: &str) -> Option<&'static str> {
    match service {
        "uPic" => Some("/Applications/uPic.app/Contents/MacOS/uPic -o url -u %s"),
        "Picsee" => Some("/Applications/Picsee.app/Contents/MacOS/Picsee -u %s"),
        "custom" => Some(""),
        _ => None,
    }
}

/// Errors from applying a CLI settings update
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The key does not name a setting
    #[error("Unknown setting: {key}")]
    UnknownKey { key: String },
    /// The value does not name an upload service preset
    #[error("Unknown upload service: {name} (expected one of: {expected})")]
    UnknownService { name: String, expected: String },
    /// A boolean setting received a non-boolean value
    #[error("Invalid value for {key}: {value} (expected true or false)")]
    InvalidBool { key: String, value: String },
}

/// In-memory settings, threaded explicitly into the orchestrator and
/// gateway rather than held as process-wide mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    /// Selected upload service preset, or `custom`.
    pub upload_service: String,
    /// Command template with a `%s` placeholder for the file path.
    /// Authoritative when `upload_service` is `custom`.
    pub upload_command: String,
    /// Accepted extensions, lower-cased and dot-prefixed.
    pub upload_file_format: BTreeSet<String>,
    /// Delete the local source file after a successful upload.
    pub delete_source_file: bool,
    /// Upload just-saved attachment files automatically (watch mode).
    pub auto_upload_on_save: bool,
    /// Default file for the `test-upload` diagnostic.
    pub test_file_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upload_service: "uPic".to_string(),
            upload_command: preset_command("uPic").unwrap_or_default().to_string(),
            upload_file_format: [".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".avif", ".bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            delete_source_file: false,
            auto_upload_on_save: false,
            test_file_path: String::new(),
        }
    }
}

impl Settings {
    /// The command template actually used for uploads.
    ///
    /// Presets win over the stored command unless the service is
    /// `custom`, in which case the user-provided template applies.
    pub fn effective_command(&self) -> &str {
        if self.upload_service != "custom" {
            if let Some(preset) = preset_command(&self.upload_service) {
                return preset;
            }
        }
        &self.upload_command
    }

    /// Whether a file name's extension is in the accepted-format set.
    pub fn is_uploadable_file(&self, file_name: &str) -> bool {
        let ext = match file_name.rsplit('.').next() {
            Some(ext) if ext != file_name => ext.to_lowercase(),
            _ => return false,
        };
        self.upload_file_format.contains(&format!(".{}", ext))
    }

    /// Load settings for the given vault root.
    ///
    /// Reads the vault-local config when present, falling back to the
    /// user-level config, then to defaults. Missing files are not an
    /// error; malformed files are.
    pub fn load(vault_root: &Path) -> Result<Self> {
        let local = vault_root.join(CONFIG_DIR).join(CONFIG_FILE);
        if local.exists() {
            return Self::load_file(&local);
        }
        if let Some(global) = global_config_path() {
            if global.exists() {
                return Self::load_file(&global);
            }
        }
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let file: SettingsFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(file.merge_into_defaults())
    }

    /// Persist settings into the vault-local config file.
    pub fn save(&self, vault_root: &Path) -> Result<()> {
        let dir = vault_root.join(CONFIG_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let file = SettingsFile::from_settings(self);
        let content = toml::to_string_pretty(&file).context("Failed to serialize settings")?;
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Apply a `key=value` style update from the CLI.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys, unknown service names, or
    /// malformed boolean values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "upload_service" => {
                if preset_command(value).is_none() {
                    return Err(ConfigError::UnknownService {
                        name: value.to_string(),
                        expected: UPLOAD_SERVICES.join(", "),
                    });
                }
                self.upload_service = value.to_string();
                if value != "custom" {
                    self.upload_command = preset_command(value).unwrap_or_default().to_string();
                }
            }
            "upload_command" => self.upload_command = value.to_string(),
            "upload_file_format" => {
                self.upload_file_format = parse_format_list(value);
            }
            "delete_source_file" => self.delete_source_file = parse_bool(key, value)?,
            "auto_upload_on_save" => self.auto_upload_on_save = parse_bool(key, value)?,
            "test_file_path" => self.test_file_path = value.to_string(),
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidBool {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Normalize one extension: lower-case, dot-prefixed.
fn normalize_format(ext: &str) -> Option<String> {
    let trimmed = ext.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('.') {
        Some(trimmed)
    } else {
        Some(format!(".{}", trimmed))
    }
}

/// Parse a comma-delimited extension list into the normalized set.
fn parse_format_list(raw: &str) -> BTreeSet<String> {
    raw.split(',').filter_map(normalize_format).collect()
}

/// On-disk form of [`Settings`].
///
/// All fields optional so partial files merge over defaults; the format
/// set round-trips through a comma-delimited string.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_file_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_source_file: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_upload_on_save: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_file_path: Option<String>,
}

impl SettingsFile {
    fn merge_into_defaults(self) -> Settings {
        let defaults = Settings::default();
        let upload_service = self.upload_service.unwrap_or(defaults.upload_service);

        // A stored custom command only applies when the service is
        // custom; preset services pin their own template.
        let upload_command = match (upload_service.as_str(), self.upload_command) {
            ("custom", Some(command)) => command,
            (service, _) => preset_command(service)
                .map(str::to_string)
                .unwrap_or(defaults.upload_command),
        };

        Settings {
            upload_service,
            upload_command,
            upload_file_format: self
                .upload_file_format
                .map(|raw| parse_format_list(&raw))
                .unwrap_or(defaults.upload_file_format),
            delete_source_file: self.delete_source_file.unwrap_or(defaults.delete_source_file),
            auto_upload_on_save: self
                .auto_upload_on_save
                .unwrap_or(defaults.auto_upload_on_save),
            test_file_path: self.test_file_path.unwrap_or(defaults.test_file_path),
        }
    }

    fn from_settings(settings: &Settings) -> Self {
        Self {
            upload_service: Some(settings.upload_service.clone()),
            upload_command: Some(settings.upload_command.clone()),
            upload_file_format: Some(
                settings
                    .upload_file_format
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            delete_source_file: Some(settings.delete_source_file),
            auto_upload_on_save: Some(settings.auto_upload_on_save),
            test_file_path: Some(settings.test_file_path.clone()),
        }
    }
}

/// User-level config path (`~/.config/mdlift/config.toml`).
fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mdlift").join(CONFIG_FILE))
}
