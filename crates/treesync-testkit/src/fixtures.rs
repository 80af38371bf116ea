//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use treesync_core::RelPath;
use treesync_fs::DiskFilesystem;
use treesync_sync::{MemoryRemote, Reconciler, SyncConfig};

/// Parse a relative path, panicking on invalid input.
pub fn rel(path: &str) -> RelPath {
    RelPath::new(path).unwrap_or_else(|e| panic!("bad test path {path:?}: {e}"))
}

/// A temp directory on disk paired with an in-memory remote.
pub struct SyncFixture {
    pub dir: TempDir,
    pub local: Arc<DiskFilesystem>,
    pub remote: Arc<MemoryRemote>,
}

impl SyncFixture {
    /// Create a fixture with an empty local root and empty remote.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_remote(MemoryRemote::new())
    }

    /// Create a fixture around a preconfigured remote.
    pub fn with_remote(remote: MemoryRemote) -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
            local: Arc::new(DiskFilesystem::new()),
            remote: Arc::new(remote),
        })
    }

    /// The local sync root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a local file, creating parent directories.
    pub fn write_local(&self, path: &str, contents: &[u8]) -> anyhow::Result<()> {
        let host = rel(path).to_host_path(self.root());
        if let Some(parent) = host.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(host, contents)?;
        Ok(())
    }

    /// Read a local file.
    pub fn read_local(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        Ok(std::fs::read(rel(path).to_host_path(self.root()))?)
    }

    /// Whether a local file exists.
    pub fn local_exists(&self, path: &str) -> bool {
        rel(path).to_host_path(self.root()).exists()
    }

    /// Seed a remote file.
    pub async fn seed_remote(&self, path: &str, contents: &[u8]) {
        self.remote
            .insert_file(rel(path), contents.to_vec())
            .await;
    }

    /// Read a remote file as raw bytes.
    pub async fn remote_bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.remote.file(&rel(path)).await.map(|b| b.to_vec())
    }

    /// Default configuration rooted at the temp dir.
    pub fn config(&self) -> SyncConfig {
        SyncConfig::new(self.root())
    }

    /// A reconciler with the default configuration.
    pub fn reconciler(&self) -> Reconciler<DiskFilesystem, MemoryRemote> {
        self.reconciler_with(self.config())
    }

    /// A reconciler with a custom configuration.
    pub fn reconciler_with(&self, config: SyncConfig) -> Reconciler<DiskFilesystem, MemoryRemote> {
        Reconciler::new(Arc::clone(&self.local), Arc::clone(&self.remote), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_local_roundtrip() {
        let fixture = SyncFixture::new().unwrap();
        fixture.write_local("nested/dir/a.txt", b"hi").unwrap();
        assert!(fixture.local_exists("nested/dir/a.txt"));
        assert_eq!(fixture.read_local("nested/dir/a.txt").unwrap(), b"hi");
    }

    #[tokio::test]
    async fn test_fixture_remote_seed() {
        let fixture = SyncFixture::new().unwrap();
        fixture.seed_remote("r.txt", b"remote").await;
        assert_eq!(fixture.remote_bytes("r.txt").await, Some(b"remote".to_vec()));
        assert_eq!(fixture.remote_bytes("missing").await, None);
    }
}
