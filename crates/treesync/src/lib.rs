//! # Treesync
//!
//! Content-addressed synchronization of a local directory with a remote
//! object tree reachable only through a proxy.
//!
//! ## Overview
//!
//! Each reconciliation pass:
//!
//! - **Fingerprints** every local file (BLAKE3, streamed)
//! - **Fetches** the remote checksum tree through a [`RemoteProxy`]
//! - **Diffs** the two into changed / remote-only / local-only paths
//! - **Transfers** in that order: push changed, pull remote-only, push local-only
//!
//! The [`SyncScheduler`] repeats passes on a fixed interval and never lets
//! two overlap: a tick that lands while a pass is running is dropped.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use treesync::{SyncScheduler, TreesyncConfig};
//! use treesync::fs::DiskFilesystem;
//! use treesync::sync::MemoryRemote;
//!
//! async fn example() {
//!     let config = TreesyncConfig::new("/srv/objects").with_interval(Duration::from_secs(10));
//!     let local = Arc::new(DiskFilesystem::new());
//!     let remote = Arc::new(MemoryRemote::new());
//!
//!     let mut scheduler = SyncScheduler::from_config(local, remote, config).unwrap();
//!
//!     // One-shot pass
//!     let report = scheduler.run_once().await.into_result().unwrap();
//!     println!("pulled {} pushed {}", report.pulled, report.pushed);
//!
//!     // Periodic passes
//!     scheduler.start();
//!     // ...
//!     scheduler.stop();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `treesync::core` - Paths, fingerprints, checksum trees, diff
//! - `treesync::fs` - Local filesystem trait and tree builder
//! - `treesync::sync` - Remote proxy trait and reconciler

pub mod config;
pub mod error;
pub mod scheduler;

// Re-export component crates
pub use treesync_core as core;
pub use treesync_fs as fs;
pub use treesync_sync as sync;

pub use config::{SchedulerConfig, TreesyncConfig, DEFAULT_INTERVAL};
pub use error::{Result, TreesyncError};
pub use scheduler::{SyncScheduler, SyncTrigger, TickOutcome};

// Re-export commonly used types
pub use treesync_core::{diff, ChecksumTree, DiffResult, Fingerprint, IgnorePolicy, RelPath};
pub use treesync_fs::{ChecksumTreeBuilder, LocalFilesystem};
pub use treesync_sync::{Reconciler, RemoteProxy, SyncConfig, SyncError, SyncReport};
