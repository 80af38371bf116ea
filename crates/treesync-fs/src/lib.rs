//! # Treesync FS
//!
//! The local side of a sync: a trait-based filesystem interface with disk
//! and in-memory implementations, and the builder that turns a directory
//! into a [`ChecksumTree`](treesync_core::ChecksumTree).
//!
//! ## Key Types
//!
//! - [`LocalFilesystem`] - The async trait the sync engine reads and writes through
//! - [`DiskFilesystem`] - `tokio::fs` implementation with atomic writes
//! - [`MemoryFilesystem`] - In-memory implementation for tests
//! - [`ChecksumTreeBuilder`] - Recursive walk producing a checksum tree
//!
//! ## Usage
//!
//! ```rust,no_run
//! use treesync_core::IgnorePolicy;
//! use treesync_fs::{ChecksumTreeBuilder, DiskFilesystem};
//!
//! async fn example() {
//!     let fs = DiskFilesystem::new();
//!     let ignore = IgnorePolicy::default();
//!     let tree = ChecksumTreeBuilder::new(&fs, &ignore)
//!         .build("/srv/objects".as_ref())
//!         .await
//!         .unwrap();
//!     println!("{} files", tree.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **All or nothing**: a build either returns the whole tree or an error
//! - **Ignored subtrees**: an ignored directory is never descended into
//! - **Idempotent mkdir**: creating an existing directory succeeds

pub mod builder;
pub mod disk;
pub mod error;
pub mod memory;
pub mod traits;

pub use builder::ChecksumTreeBuilder;
pub use disk::DiskFilesystem;
pub use error::{FsError, Result};
pub use memory::MemoryFilesystem;
pub use traits::{DirEntry, FileReader, LocalFilesystem};
