//! Remote proxies with controllable timing and failure.
//!
//! Both wrap a [`MemoryRemote`] and differ only in how they answer
//! [`RemoteProxy::checksum_tree`], which is the first call of every pass.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Notify, Semaphore};
use treesync_core::{ChecksumTree, RelPath};
use treesync_sync::{MemoryRemote, RemoteProxy, Result, SyncError};

/// A remote whose tree fetch blocks until released.
///
/// Lets a test hold a pass open at a known point and fire more ticks
/// against it.
pub struct GatedRemote {
    inner: MemoryRemote,
    entered: Notify,
    gate: Semaphore,
    tree_calls: AtomicUsize,
}

impl GatedRemote {
    pub fn new(inner: MemoryRemote) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            gate: Semaphore::new(0),
            tree_calls: AtomicUsize::new(0),
        }
    }

    /// Wait until some pass is blocked inside the tree fetch.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one blocked tree fetch proceed.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Number of tree fetches started so far.
    pub fn tree_calls(&self) -> usize {
        self.tree_calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryRemote {
        &self.inner
    }
}

#[async_trait]
impl RemoteProxy for GatedRemote {
    async fn checksum_tree(&self) -> Result<ChecksumTree> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        // notify_one stores a permit, so a waiter that arrives late still wakes.
        self.entered.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;
        permit.forget();
        self.inner.checksum_tree().await
    }

    async fn read_file(&self, path: &RelPath) -> Result<Bytes> {
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &RelPath, contents: Bytes) -> Result<Option<Bytes>> {
        self.inner.write_file(path, contents).await
    }
}

/// A remote whose tree fetch panics a fixed number of times.
pub struct PanickingRemote {
    inner: MemoryRemote,
    remaining: AtomicUsize,
}

impl PanickingRemote {
    /// Panic on the next `times` tree fetches, then behave normally.
    pub fn new(inner: MemoryRemote, times: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(times),
        }
    }

    pub fn inner(&self) -> &MemoryRemote {
        &self.inner
    }
}

#[async_trait]
impl RemoteProxy for PanickingRemote {
    async fn checksum_tree(&self) -> Result<ChecksumTree> {
        let armed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            panic!("remote tree fetch panicked");
        }
        self.inner.checksum_tree().await
    }

    async fn read_file(&self, path: &RelPath) -> Result<Bytes> {
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &RelPath, contents: Bytes) -> Result<Option<Bytes>> {
        self.inner.write_file(path, contents).await
    }
}
