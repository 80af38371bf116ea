//! # Treesync Testkit
//!
//! Testing utilities for treesync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a temp-dir local side paired with an in-memory remote
//! - **Remotes**: proxies that block or panic on demand, for exercising the
//!   scheduler's guard
//! - **Generators**: proptest strategies for paths, file sets and trees
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use treesync_testkit::SyncFixture;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let fixture = SyncFixture::new()?;
//!     fixture.write_local("a.txt", b"hello")?;
//!     let report = fixture.reconciler().run().await?;
//!     assert_eq!(report.pushed, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use treesync_testkit::generators::checksum_tree;
//!
//! proptest! {
//!     #[test]
//!     fn test_diff_with_self_is_empty(tree in checksum_tree()) {
//!         prop_assert!(treesync_core::diff(&tree, &tree).is_empty());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod remotes;

pub use fixtures::{rel, SyncFixture};
pub use generators::{checksum_tree, file_set, rel_path};
pub use remotes::{GatedRemote, PanickingRemote};
