//! Organizer configuration and its JSON persistence.
//!
//! The configuration names one source directory and a set of extension rules.
//! It is stored as pretty-printed JSON (4-space indent) in the user's home
//! directory:
//!
//! ```json
//! {
//!     "source_directory": "/home/me/Downloads",
//!     "rules": {
//!         ".pdf": "/home/me/Documents/pdf",
//!         ".png": "/home/me/Pictures"
//!     }
//! }
//! ```
//!
//! A missing file is not an error; it yields an empty configuration.

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name of the per-user configuration, placed directly in the home directory.
pub const CONFIG_FILE_NAME: &str = ".file_organizer_config.json";

/// Errors that can occur while loading, saving, or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The home directory could not be determined.
    #[error("could not determine the home directory")]
    NoHomeDirectory,
    /// Reading or writing the configuration file failed.
    #[error("I/O error on configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not a valid configuration document.
    #[error("invalid configuration in {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A rule was given without an extension.
    #[error("extension must not be empty")]
    EmptyExtension,
    /// A rule was given without a destination.
    #[error("destination for {0} must not be empty")]
    EmptyDestination(String),
}

/// Source directory plus extension-to-destination rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Directory whose top-level files get routed. Empty means "not configured".
    #[serde(default, alias = "source_dir")]
    pub source_directory: String,

    /// Normalized extension (".pdf") to destination directory.
    #[serde(default, alias = "extensions")]
    pub rules: BTreeMap<String, String>,
}

/// Lowercases an extension and adds the leading "." when missing.
///
/// Returns `None` for input that is empty or only a dot.
pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim();
    let bare = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if bare.is_empty() {
        return None;
    }
    Some(format!(".{}", bare.to_lowercase()))
}

impl OrganizerConfig {
    /// Creates a configuration for `source_directory` with no rules.
    pub fn new(source_directory: impl Into<String>) -> Self {
        Self {
            source_directory: source_directory.into(),
            rules: BTreeMap::new(),
        }
    }

    /// Returns the default configuration path, `~/.file_organizer_config.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoHomeDirectory)
    }

    /// Loads from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Loads from `path`, falling back to an empty configuration if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file exists but cannot be read and
    /// `ConfigError::Invalid` if its JSON does not parse.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    /// Writes this configuration to `path` as JSON indented with four spaces.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let mut buf = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)
            .map_err(|source| ConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;

        fs::write(path, buf).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), rules = self.rules.len(), "configuration saved");
        Ok(())
    }

    /// Replaces the source directory.
    pub fn set_source_directory(&mut self, dir: impl Into<String>) {
        self.source_directory = dir.into();
    }

    /// Adds or replaces the rule for `ext`, normalizing the key.
    ///
    /// Returns the normalized extension that was stored.
    pub fn add_rule(&mut self, ext: &str, destination: &str) -> Result<String, ConfigError> {
        let key = normalize_extension(ext).ok_or(ConfigError::EmptyExtension)?;
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(ConfigError::EmptyDestination(key));
        }
        self.rules.insert(key.clone(), destination.to_string());
        Ok(key)
    }

    /// Removes the rule for `ext`, returning its destination if one existed.
    pub fn remove_rule(&mut self, ext: &str) -> Option<String> {
        normalize_extension(ext).and_then(|key| self.rules.remove(&key))
    }

    /// True when a source directory has been set.
    pub fn has_source_directory(&self) -> bool {
        !self.source_directory.trim().is_empty()
    }
}
