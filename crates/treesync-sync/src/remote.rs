//! Remote proxy abstraction.
//!
//! The remote side is reachable only through an opaque RPC boundary. This
//! trait is that boundary; implementations may sit on HTTP, IPC, or any
//! other transport.

use async_trait::async_trait;
use bytes::Bytes;
use treesync_core::{ChecksumTree, RelPath};

use crate::error::Result;

/// Proxy to the remote object tree.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RemoteProxy: Send + Sync {
    /// Fetch the remote checksum tree.
    async fn checksum_tree(&self) -> Result<ChecksumTree>;

    /// Read a remote file.
    async fn read_file(&self, path: &RelPath) -> Result<Bytes>;

    /// Write a remote file.
    ///
    /// Returns `None` if the content was accepted as-is, or `Some(merged)`
    /// if the remote produced authoritative merged content instead.
    async fn write_file(&self, path: &RelPath, contents: Bytes) -> Result<Option<Bytes>>;
}

/// A simple in-memory remote for testing.
///
/// Supports a merge hook and fault injection for reads, writes and tree
/// fetches.
pub mod memory {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use tokio::sync::RwLock;
    use treesync_core::fingerprint_bytes;

    use crate::error::SyncError;

    /// Merge hook: `(path, incoming, existing) -> merged content`.
    pub type MergeFn =
        Box<dyn Fn(&RelPath, &Bytes, Option<&Bytes>) -> Option<Bytes> + Send + Sync>;

    #[derive(Default)]
    struct MemoryRemoteInner {
        files: BTreeMap<RelPath, Bytes>,
        failing_reads: BTreeSet<RelPath>,
        failing_writes: BTreeSet<RelPath>,
        tree_unavailable: bool,
        writes: Vec<RelPath>,
    }

    /// In-memory remote implementation.
    #[derive(Default)]
    pub struct MemoryRemote {
        inner: RwLock<MemoryRemoteInner>,
        merge: Option<MergeFn>,
    }

    impl MemoryRemote {
        /// Create an empty remote.
        pub fn new() -> Self {
            Self::default()
        }

        /// Install a merge hook consulted on every write.
        pub fn with_merge(mut self, merge: MergeFn) -> Self {
            self.merge = Some(merge);
            self
        }

        /// Seed a file without recording a write.
        pub async fn insert_file(&self, path: RelPath, contents: impl Into<Bytes>) {
            self.inner.write().await.files.insert(path, contents.into());
        }

        /// Contents of a file, if present.
        pub async fn file(&self, path: &RelPath) -> Option<Bytes> {
            self.inner.read().await.files.get(path).cloned()
        }

        /// Snapshot of every stored file.
        pub async fn files(&self) -> BTreeMap<RelPath, Bytes> {
            self.inner.read().await.files.clone()
        }

        /// Paths written through [`RemoteProxy::write_file`], in order.
        pub async fn writes(&self) -> Vec<RelPath> {
            self.inner.read().await.writes.clone()
        }

        pub async fn fail_reads_of(&self, path: RelPath) {
            self.inner.write().await.failing_reads.insert(path);
        }

        pub async fn fail_writes_of(&self, path: RelPath) {
            self.inner.write().await.failing_writes.insert(path);
        }

        /// Make [`RemoteProxy::checksum_tree`] fail until reset.
        pub async fn set_tree_unavailable(&self, unavailable: bool) {
            self.inner.write().await.tree_unavailable = unavailable;
        }
    }

    #[async_trait]
    impl RemoteProxy for MemoryRemote {
        async fn checksum_tree(&self) -> Result<ChecksumTree> {
            let inner = self.inner.read().await;
            if inner.tree_unavailable {
                return Err(SyncError::Remote("remote unreachable".into()));
            }
            Ok(inner
                .files
                .iter()
                .map(|(path, contents)| (path.clone(), fingerprint_bytes(contents)))
                .collect())
        }

        async fn read_file(&self, path: &RelPath) -> Result<Bytes> {
            let inner = self.inner.read().await;
            if inner.failing_reads.contains(path) {
                return Err(SyncError::Remote(format!("read of {path} failed")));
            }
            inner
                .files
                .get(path)
                .cloned()
                .ok_or_else(|| SyncError::Remote(format!("no such remote file: {path}")))
        }

        async fn write_file(&self, path: &RelPath, contents: Bytes) -> Result<Option<Bytes>> {
            let mut inner = self.inner.write().await;
            if inner.failing_writes.contains(path) {
                return Err(SyncError::Remote(format!("write of {path} failed")));
            }

            let merged = self
                .merge
                .as_ref()
                .and_then(|merge| merge(path, &contents, inner.files.get(path)));

            let stored = merged.clone().unwrap_or(contents);
            inner.files.insert(path.clone(), stored);
            inner.writes.push(path.clone());
            Ok(merged)
        }
    }
}
