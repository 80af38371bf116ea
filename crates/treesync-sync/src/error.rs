//! Error types for the sync module.

use thiserror::Error;
use treesync_core::CoreError;
use treesync_fs::FsError;

use crate::reconcile::SyncReport;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote proxy failed or was unreachable.
    #[error("remote error: {0}")]
    Remote(String),

    /// Local filesystem operation failed.
    #[error("local filesystem error: {0}")]
    Fs(#[from] FsError),

    /// A path or fingerprint was malformed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// One or more transfers failed; the rest of the pass still ran.
    #[error("{} of {} transfers failed", .0.failures.len(), .0.attempted())]
    PartialFailure(Box<SyncReport>),
}

impl SyncError {
    /// Whether a later pass may succeed without intervention.
    ///
    /// A missing or non-directory sync root is structural; everything else,
    /// including a file vanishing mid-walk, is worth retrying on the next
    /// tick.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Fs(FsError::RootMissing(_) | FsError::NotADirectory(_)) => false,
            SyncError::Core(_) => false,
            _ => true,
        }
    }

    /// The report of a partially failed pass.
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncError::PartialFailure(report) => Some(report),
            _ => None,
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
