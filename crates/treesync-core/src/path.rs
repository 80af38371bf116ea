//! Relative paths inside a sync root.
//!
//! Every path that appears in a checksum tree is a [`RelPath`]: forward-slash
//! separated, relative, and free of `.`/`..` segments. Trees built on hosts
//! with different separators therefore compare equal, and a path received
//! from a remote can never resolve outside the local root.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, Result};

/// Canonical separator used in every [`RelPath`].
pub const SEPARATOR: char = '/';

/// A validated path relative to a sync root.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelPath(String);

impl RelPath {
    /// Parse a forward-slash relative path.
    pub fn new(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(invalid(path, "path is empty"));
        }
        if path.starts_with(SEPARATOR) {
            return Err(invalid(path, "path is absolute"));
        }
        for segment in path.split(SEPARATOR) {
            check_segment(path, segment)?;
        }
        Ok(Self(path.to_string()))
    }

    /// Build a path from individual segments.
    pub fn from_segments<'a, I>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined: Vec<&str> = segments.into_iter().collect();
        Self::new(&joined.join("/"))
    }

    /// Convert a host path (relative to some root) into canonical form.
    ///
    /// Only normal components are accepted; `..`, prefixes and roots fail.
    pub fn from_host_path(path: &Path) -> Result<Self> {
        let display = path.to_string_lossy();
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(os) => {
                    let segment = os
                        .to_str()
                        .ok_or_else(|| invalid(&display, "path is not valid UTF-8"))?;
                    segments.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir => return Err(invalid(&display, "path escapes the root")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid(&display, "path is absolute"))
                }
            }
        }
        Self::from_segments(segments)
    }

    /// Append a single entry name.
    pub fn join(&self, name: &str) -> Result<Self> {
        check_segment(name, name)?;
        Ok(Self(format!("{}{}{}", self.0, SEPARATOR, name)))
    }

    /// The path as a forward-slash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// The final segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    /// The containing directory, or `None` for a top-level entry.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once(SEPARATOR)
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Resolve against a host root directory.
    pub fn to_host_path(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.segments() {
            out.push(segment);
        }
        out
    }
}

fn check_segment(path: &str, segment: &str) -> Result<()> {
    match segment {
        "" => Err(invalid(path, "empty path segment")),
        "." | ".." => Err(invalid(path, "relative segment")),
        s if s.contains('\\') => Err(invalid(path, "backslash in segment")),
        s if s.contains('\0') => Err(invalid(path, "NUL in segment")),
        s if s.contains(SEPARATOR) => Err(invalid(path, "separator in entry name")),
        _ => Ok(()),
    }
}

fn invalid(path: &str, reason: &'static str) -> CoreError {
    CoreError::InvalidPath {
        path: path.to_string(),
        reason,
    }
}

impl fmt::Debug for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelPath({})", self.0)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RelPath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl TryFrom<&str> for RelPath {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RelPath> for String {
    fn from(path: RelPath) -> Self {
        path.0
    }
}
