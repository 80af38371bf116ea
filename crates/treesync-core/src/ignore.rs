//! Ignore policy for OS metadata and hidden entries.

use std::collections::BTreeSet;

use crate::path::RelPath;

/// Entry names ignored by default, in addition to dot-prefixed names.
pub const DEFAULT_IGNORED_NAMES: &[&str] = &["Thumbs.db", "ehthumbs.db", "desktop.ini"];

/// Decides which directory entries never take part in a sync.
///
/// An ignored directory is skipped together with everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnorePolicy {
    skip_hidden: bool,
    names: BTreeSet<String>,
}

impl IgnorePolicy {
    /// A policy that ignores nothing.
    pub fn none() -> Self {
        Self {
            skip_hidden: false,
            names: BTreeSet::new(),
        }
    }

    /// Toggle skipping of dot-prefixed entries (`.DS_Store`, `.git`, ...).
    pub fn with_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }

    /// Ignore an additional exact entry name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Whether a single entry name is ignored.
    pub fn is_ignored(&self, name: &str) -> bool {
        (self.skip_hidden && name.starts_with('.')) || self.names.contains(name)
    }

    /// Whether any segment of `path` is ignored.
    pub fn is_path_ignored(&self, path: &RelPath) -> bool {
        path.segments().any(|segment| self.is_ignored(segment))
    }
}

impl Default for IgnorePolicy {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            names: DEFAULT_IGNORED_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
