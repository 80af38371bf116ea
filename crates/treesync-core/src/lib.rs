//! # Treesync Core
//!
//! Pure primitives for treesync: relative paths, content fingerprints,
//! checksum trees and the three-way diff between them.
//!
//! Apart from the streaming hasher, which reads from any
//! [`tokio::io::AsyncRead`], this crate does no I/O.
//!
//! ## Key Types
//!
//! - [`RelPath`] - Validated forward-slash path relative to a sync root
//! - [`Fingerprint`] - BLAKE3 digest of a file's bytes
//! - [`ChecksumTree`] - Flat mapping from [`RelPath`] to [`Fingerprint`]
//! - [`DiffResult`] - Paths partitioned into changed / remote-only / local-only
//! - [`IgnorePolicy`] - Entry names excluded from every tree
//!
//! ## Usage
//!
//! ```rust
//! use treesync_core::{diff, fingerprint_bytes, ChecksumTree, RelPath};
//!
//! let mut local = ChecksumTree::new();
//! local.insert(RelPath::new("a.txt").unwrap(), fingerprint_bytes(b"hello"));
//!
//! let remote = ChecksumTree::new();
//! let result = diff(&local, &remote);
//! assert_eq!(result.local_only.len(), 1);
//! ```

pub mod convergence;
pub mod diff;
pub mod error;
pub mod hash;
pub mod ignore;
pub mod path;
pub mod tree;

pub use convergence::{verify_convergence, ConvergenceResult};
pub use diff::{diff, DiffResult};
pub use error::{CoreError, Result};
pub use hash::{fingerprint_bytes, fingerprint_reader, Fingerprint, READ_CHUNK_SIZE};
pub use ignore::{IgnorePolicy, DEFAULT_IGNORED_NAMES};
pub use path::RelPath;
pub use tree::ChecksumTree;
