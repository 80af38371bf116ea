//! Configuration for reconciliation passes.

use std::path::PathBuf;

use treesync_core::IgnorePolicy;

/// Configuration for [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Local directory being synchronized.
    pub root: PathBuf,
    /// Overwrite the local file when the remote answers a write with
    /// merged content. Off by default: local content is authoritative.
    pub accept_remote_merge: bool,
    /// Entries excluded from both trees.
    pub ignore: IgnorePolicy,
    /// Compute and log the diff without transferring anything.
    pub dry_run: bool,
    /// Rebuild both trees after a clean pass and check that they agree.
    pub verify: bool,
}

impl SyncConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            accept_remote_merge: false,
            ignore: IgnorePolicy::default(),
            dry_run: false,
            verify: false,
        }
    }

    pub fn with_remote_merge(mut self, accept: bool) -> Self {
        self.accept_remote_merge = accept;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnorePolicy) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
