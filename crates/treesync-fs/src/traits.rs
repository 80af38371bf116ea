//! LocalFilesystem trait: the interface the sync engine uses for the local
//! side.
//!
//! Paths passed to these methods are host paths (the sync root joined with a
//! [`RelPath`](treesync_core::RelPath)).

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::Result;

/// A streaming handle to a file's contents.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (a single path segment).
    pub name: String,
    /// True for directories, false for regular files.
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Async interface to the local filesystem.
///
/// # Design Notes
///
/// - `list_directory` returns a single level; recursion is the caller's job
///   so that ignored subtrees can be pruned before they are listed.
/// - Entries that are neither regular files nor directories are omitted.
/// - `make_directory` creates missing ancestors and succeeds if the
///   directory already exists.
#[async_trait]
pub trait LocalFilesystem: Send + Sync {
    /// List the immediate children of a directory.
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Whether `path` is a directory. Fails with `NotFound` if it is missing.
    async fn is_dir(&self, path: &Path) -> Result<bool>;

    /// Open a file for streaming reads.
    async fn open_read(&self, path: &Path) -> Result<FileReader>;

    /// Read a whole file.
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Create or replace a file. The parent directory must exist.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create a directory and any missing ancestors.
    async fn make_directory(&self, path: &Path) -> Result<()>;
}
