//! The source a store reloads from.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::tree::{ConfigNode, Table};

/// Where the tree was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceBinding {
    /// A file decoded by the store's persistence adapter.
    File {
        path: PathBuf,
        /// Modification time observed at the last successful load.
        last_modified: Option<SystemTime>,
    },
    /// Process environment variables starting with `prefix`.
    Environment { prefix: String },
}

impl SourceBinding {
    pub fn file(path: impl Into<PathBuf>, last_modified: Option<SystemTime>) -> Self {
        SourceBinding::File {
            path: path.into(),
            last_modified,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            SourceBinding::File { path, .. } => Some(path),
            SourceBinding::Environment { .. } => None,
        }
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        match self {
            SourceBinding::File { last_modified, .. } => *last_modified,
            SourceBinding::Environment { .. } => None,
        }
    }

    pub(crate) fn set_last_modified(&mut self, modified: Option<SystemTime>) {
        if let SourceBinding::File { last_modified, .. } = self {
            *last_modified = modified;
        }
    }
}

impl fmt::Display for SourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceBinding::File { path, .. } => write!(f, "{}", path.display()),
            SourceBinding::Environment { prefix } => write!(f, "environment (prefix '{}')", prefix),
        }
    }
}

/// Collect environment variables starting with `prefix` as flat leaves.
///
/// The prefix and any `_` that follows it are stripped; variables that are
/// not valid UTF-8 or leave an empty name are skipped.
pub(crate) fn environment_table(
    prefix: &str,
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> Table {
    let mut table = Table::new();
    for (name, value) in vars {
        let (Some(name), Some(value)) = (name.to_str(), value.to_str()) else {
            continue;
        };
        let Some(stripped) = name.strip_prefix(prefix) else {
            continue;
        };
        let key = stripped.trim_start_matches('_');
        if key.is_empty() {
            continue;
        }
        table.insert(key.to_string(), ConfigNode::Leaf(value.to_string()));
    }
    table
}
