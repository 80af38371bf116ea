//! Configuration for treesync.

use std::path::PathBuf;
use std::time::Duration;

use treesync_core::IgnorePolicy;
use treesync_sync::SyncConfig;

use crate::error::{Result, TreesyncError};

/// Default time between scheduled passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Timer configuration for [`SyncScheduler`](crate::SyncScheduler).
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between ticks. Must be non-zero.
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Complete configuration: what to sync and how often.
#[derive(Debug, Clone)]
pub struct TreesyncConfig {
    /// Reconciliation configuration.
    pub sync: SyncConfig,
    /// Scheduler configuration.
    pub scheduler: SchedulerConfig,
}

impl TreesyncConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            sync: SyncConfig::new(root),
            scheduler: SchedulerConfig::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.scheduler.interval = interval;
        self
    }

    pub fn with_remote_merge(mut self, accept: bool) -> Self {
        self.sync.accept_remote_merge = accept;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnorePolicy) -> Self {
        self.sync.ignore = ignore;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.sync.dry_run = dry_run;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.sync.verify = verify;
        self
    }

    /// Reject configurations the scheduler cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.interval.is_zero() {
            return Err(TreesyncError::InvalidConfig(
                "scheduler interval must be non-zero".into(),
            ));
        }
        if self.sync.root.as_os_str().is_empty() {
            return Err(TreesyncError::InvalidConfig("sync root is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TreesyncConfig::new("/data");
        assert_eq!(config.scheduler.interval, DEFAULT_INTERVAL);
        assert!(!config.sync.accept_remote_merge);
        assert!(!config.sync.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_interval_and_empty_root() {
        let zero = TreesyncConfig::new("/data").with_interval(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(TreesyncError::InvalidConfig(_))));

        let empty = TreesyncConfig::new("");
        assert!(matches!(empty.validate(), Err(TreesyncError::InvalidConfig(_))));
    }
}
