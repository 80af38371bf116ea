//! # Treesync Sync
//!
//! Reconciliation of a local directory with a remote checksum tree reachable
//! only through a [`RemoteProxy`].
//!
//! ## Overview
//!
//! A pass builds a fresh local [`ChecksumTree`](treesync_core::ChecksumTree),
//! fetches the remote one, diffs them and applies the transfers:
//!
//! ```text
//! Local                               Remote
//!   |-- build tree        checksum_tree --|
//!   |                diff                 |
//!   |-- changed:     read -> write ------>|  (optional merged content back)
//!   |<-------------- read -- remote-only -|
//!   |-- local-only:  read -> write ------>|
//! ```
//!
//! ## Key Properties
//!
//! - **Idempotent**: a second pass over converged trees transfers nothing
//! - **Partial-failure tolerant**: one failed transfer does not stop the rest
//! - **Local-authoritative**: merged content from the remote is ignored
//!   unless [`SyncConfig::accept_remote_merge`] is set
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use treesync_fs::DiskFilesystem;
//! use treesync_sync::{MemoryRemote, Reconciler, SyncConfig};
//!
//! async fn example() {
//!     let local = Arc::new(DiskFilesystem::new());
//!     let remote = Arc::new(MemoryRemote::new());
//!     let reconciler = Reconciler::new(local, remote, SyncConfig::new("/srv/objects"));
//!
//!     let report = reconciler.run().await.unwrap();
//!     println!("pushed {} pulled {}", report.pushed, report.pulled);
//! }
//! ```

pub mod config;
pub mod error;
pub mod reconcile;
pub mod remote;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use reconcile::{DiffSummary, Reconciler, SyncReport, TransferFailure, TransferKind};
pub use remote::{memory::MemoryRemote, memory::MergeFn, RemoteProxy};
