//! Error types for treesync core.

use thiserror::Error;

/// Errors raised while constructing core values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A path could not be turned into a [`RelPath`](crate::RelPath).
    #[error("invalid relative path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A fingerprint string was not 64 hex characters.
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
