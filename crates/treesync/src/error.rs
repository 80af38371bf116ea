//! Error types for treesync.

use thiserror::Error;
use treesync_core::CoreError;
use treesync_fs::FsError;
use treesync_sync::SyncError;

/// Errors that can occur during treesync operations.
#[derive(Debug, Error)]
pub enum TreesyncError {
    /// Reconciliation error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Local filesystem error.
    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),

    /// Malformed path or fingerprint.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Another pass held the guard, so this one did not run.
    #[error("a sync pass is already in progress")]
    PassInProgress,
}

/// Result type for treesync operations.
pub type Result<T> = std::result::Result<T, TreesyncError>;
