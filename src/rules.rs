//! Extension-based routing rules.
//!
//! A [`RuleTable`] is built once from an [`OrganizerConfig`] when a scan or
//! watch session starts and is never mutated afterwards. Lookups consider only
//! the final suffix of a file name, so `backup.tar.gz` is routed by `.gz`.
//!
//! # Examples
//!
//! ```
//! use dirsort::config::OrganizerConfig;
//! use dirsort::rules::RuleTable;
//! use std::path::Path;
//!
//! let mut config = OrganizerConfig::new("/downloads");
//! config.add_rule(".png", "/pictures").unwrap();
//!
//! let table = RuleTable::from_config(&config);
//! assert_eq!(table.destination_for("Holiday.PNG"), Some(Path::new("/pictures")));
//! assert_eq!(table.destination_for("notes.txt"), None);
//! ```

use crate::config::{OrganizerConfig, normalize_extension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Returns the lowercased final suffix of `name`, including the leading ".".
///
/// Names without a suffix yield `None`: `README`, a trailing dot (`draft.`),
/// and dot-files whose only dot is the first character (`.bashrc`).
pub fn file_extension(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    if dot == 0 || dot + 1 == name.len() {
        return None;
    }
    Some(name[dot..].to_lowercase())
}

/// Immutable mapping from normalized extension to destination directory.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    routes: HashMap<String, PathBuf>,
}

impl RuleTable {
    /// Builds a table from the rules in `config`.
    ///
    /// Keys are normalized again so hand-edited files with ".PDF" still match.
    /// Rules with an empty destination are dropped with a warning.
    pub fn from_config(config: &OrganizerConfig) -> Self {
        let routes = config
            .rules
            .iter()
            .filter_map(|(ext, dest)| {
                let Some(key) = normalize_extension(ext) else {
                    warn!(extension = %ext, "ignoring rule with empty extension");
                    return None;
                };
                if dest.trim().is_empty() {
                    warn!(extension = %key, "ignoring rule with empty destination");
                    return None;
                }
                Some((key, PathBuf::from(dest)))
            })
            .collect();
        Self { routes }
    }

    /// Destination directory for a file named `name`, if a rule matches.
    pub fn destination_for(&self, name: &str) -> Option<&Path> {
        let ext = file_extension(name)?;
        self.routes.get(&ext).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
