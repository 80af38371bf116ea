//! Error types for filesystem operations.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use treesync_core::CoreError;

/// Errors that can occur during local filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The sync root itself does not exist.
    #[error("sync root missing: {}", .0.display())]
    RootMissing(PathBuf),

    /// Expected a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Expected a regular file.
    #[error("is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A path could not be represented.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Internal lock was poisoned.
    #[error("filesystem lock poisoned")]
    Poisoned,
}

impl FsError {
    /// Attach a path to an I/O error, keeping `NotFound` distinguishable.
    pub fn io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            _ => FsError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Result type for filesystem operations.
pub type Result<T> = std::result::Result<T, FsError>;
