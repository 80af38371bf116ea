//! Reconciliation passes.
//!
//! Implements the build / fetch / diff / transfer cycle that brings a local
//! directory and a remote tree into agreement.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn, Instrument};
use treesync_core::{diff, verify_convergence, ChecksumTree, ConvergenceResult, DiffResult, RelPath};
use treesync_fs::{ChecksumTreeBuilder, LocalFilesystem};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::remote::RemoteProxy;

/// Which phase a transfer belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Changed on both sides; local content pushed to the remote.
    Update,
    /// Remote-only; copied to the local tree.
    Pull,
    /// Local-only; copied to the remote.
    Push,
}

/// A single transfer that failed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    pub path: RelPath,
    pub kind: TransferKind,
    pub error: String,
}

/// Sizes of the three diff classes for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub changed: usize,
    pub remote_only: usize,
    pub local_only: usize,
}

impl From<&DiffResult> for DiffSummary {
    fn from(diff: &DiffResult) -> Self {
        Self {
            changed: diff.changed.len(),
            remote_only: diff.remote_only.len(),
            local_only: diff.local_only.len(),
        }
    }
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Files in the local tree.
    pub local_files: usize,
    /// Files in the remote tree (after ignore filtering).
    pub remote_files: usize,
    /// What the diff asked for.
    pub planned: DiffSummary,
    /// Changed files pushed to the remote.
    pub updated: usize,
    /// Remote-only files written locally.
    pub pulled: usize,
    /// Local-only files written to the remote.
    pub pushed: usize,
    /// Local files overwritten with merged content from the remote.
    pub merged_back: usize,
    /// Transfers that failed.
    pub failures: Vec<TransferFailure>,
    /// Whether the pass was a dry run.
    pub dry_run: bool,
    /// Wall-clock time of the pass.
    pub duration: Duration,
    /// Whether both trees agreed after the pass. `None` unless verification
    /// is enabled and the pass was clean.
    pub converged: Option<bool>,
}

impl SyncReport {
    /// Transfers attempted, successful or not.
    pub fn attempted(&self) -> usize {
        self.updated + self.pulled + self.pushed + self.failures.len()
    }

    /// Whether every attempted transfer succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, path: &RelPath, kind: TransferKind, error: &SyncError) {
        warn!(%path, ?kind, %error, "transfer failed");
        self.failures.push(TransferFailure {
            path: path.clone(),
            kind,
            error: error.to_string(),
        });
    }
}

/// Runs reconciliation passes between a local root and a remote proxy.
///
/// The most recent successfully built local tree is kept as the
/// last-known-good state; a failed build leaves it untouched.
pub struct Reconciler<L: LocalFilesystem, R: RemoteProxy> {
    local: Arc<L>,
    remote: Arc<R>,
    config: SyncConfig,
    last_local_tree: Mutex<Option<ChecksumTree>>,
}

impl<L: LocalFilesystem, R: RemoteProxy> Reconciler<L, R> {
    /// Create a reconciler.
    pub fn new(local: Arc<L>, remote: Arc<R>, config: SyncConfig) -> Self {
        Self {
            local,
            remote,
            config,
            last_local_tree: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn local(&self) -> &Arc<L> {
        &self.local
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// The last local tree that was built without error.
    pub fn last_local_tree(&self) -> Option<ChecksumTree> {
        self.last_local_tree.lock().ok().and_then(|tree| tree.clone())
    }

    /// Build the local tree.
    pub async fn local_tree(&self) -> Result<ChecksumTree> {
        let tree = ChecksumTreeBuilder::new(self.local.as_ref(), &self.config.ignore)
            .build(&self.config.root)
            .await?;

        if let Ok(mut last) = self.last_local_tree.lock() {
            *last = Some(tree.clone());
        }
        Ok(tree)
    }

    /// Fetch the remote tree, dropping entries the ignore policy excludes.
    pub async fn remote_tree(&self) -> Result<ChecksumTree> {
        let tree = self.remote.checksum_tree().await?;
        Ok(tree.without_ignored(&self.config.ignore))
    }

    /// Build both trees and diff them, without transferring anything.
    pub async fn plan(&self) -> Result<(ChecksumTree, ChecksumTree, DiffResult)> {
        let local = self.local_tree().await?;
        let remote = self.remote_tree().await?;
        let result = diff(&local, &remote);
        Ok((local, remote, result))
    }

    /// Rebuild both trees and compare them without transferring anything.
    pub async fn verify(&self) -> Result<ConvergenceResult> {
        let local = self.local_tree().await?;
        let remote = self.remote_tree().await?;
        Ok(verify_convergence(&local, &remote))
    }

    /// Run one reconciliation pass.
    ///
    /// Tree construction errors abort the pass before any transfer. After
    /// that, every transfer is attempted; if any fail the pass returns
    /// [`SyncError::PartialFailure`] carrying the full report.
    pub async fn run(&self) -> Result<SyncReport> {
        let span = info_span!("sync_pass", root = %self.config.root.display());
        self.run_pass().instrument(span).await
    }

    async fn run_pass(&self) -> Result<SyncReport> {
        let started = Instant::now();
        let (local, remote, plan) = self.plan().await?;

        let mut report = SyncReport {
            local_files: local.len(),
            remote_files: remote.len(),
            planned: DiffSummary::from(&plan),
            dry_run: self.config.dry_run,
            ..SyncReport::default()
        };

        if self.config.dry_run {
            info!(planned = ?report.planned, "dry run; no transfers");
            report.duration = started.elapsed();
            return Ok(report);
        }

        // Phase 1: changed on both sides, local wins unless merge is accepted
        for path in &plan.changed {
            match self.push(path).await {
                Ok(merged) => {
                    report.updated += 1;
                    if merged {
                        report.merged_back += 1;
                    }
                }
                Err(e) => report.record_failure(path, TransferKind::Update, &e),
            }
        }

        // Phase 2: remote -> local
        for path in &plan.remote_only {
            match self.pull(path).await {
                Ok(()) => report.pulled += 1,
                Err(e) => report.record_failure(path, TransferKind::Pull, &e),
            }
        }

        // Phase 3: local -> remote
        for path in &plan.local_only {
            match self.push(path).await {
                Ok(merged) => {
                    report.pushed += 1;
                    if merged {
                        report.merged_back += 1;
                    }
                }
                Err(e) => report.record_failure(path, TransferKind::Push, &e),
            }
        }

        report.duration = started.elapsed();
        info!(
            updated = report.updated,
            pulled = report.pulled,
            pushed = report.pushed,
            merged_back = report.merged_back,
            failed = report.failures.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "sync pass finished"
        );

        if self.config.verify && report.is_clean() {
            report.converged = match self.verify().await {
                Ok(ConvergenceResult::Converged) => Some(true),
                Ok(ConvergenceResult::Diverged {
                    changed,
                    remote_only,
                    local_only,
                }) => {
                    warn!(changed, remote_only, local_only, "trees still differ after pass");
                    Some(false)
                }
                Err(e) => {
                    warn!(error = %e, "post-pass verification failed");
                    None
                }
            };
        }

        if report.is_clean() {
            Ok(report)
        } else {
            Err(SyncError::PartialFailure(Box::new(report)))
        }
    }

    fn host_path(&self, path: &RelPath) -> PathBuf {
        path.to_host_path(&self.config.root)
    }

    /// Send local content to the remote.
    ///
    /// Returns true if the local file was replaced with merged content.
    async fn push(&self, path: &RelPath) -> Result<bool> {
        let host = self.host_path(path);
        let contents = self.local.read_file(&host).await?;
        debug!(%path, bytes = contents.len(), "pushing");

        match self.remote.write_file(path, contents).await? {
            Some(merged) if self.config.accept_remote_merge => {
                self.local.write_file(&host, &merged).await?;
                debug!(%path, "accepted merged content from remote");
                Ok(true)
            }
            Some(_) => {
                debug!(%path, "remote offered merged content; keeping local copy");
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Copy a remote file into the local tree, creating parents as needed.
    async fn pull(&self, path: &RelPath) -> Result<()> {
        let contents = self.remote.read_file(path).await?;
        let host = self.host_path(path);
        debug!(%path, bytes = contents.len(), "pulling");

        if let Some(parent) = host.parent() {
            self.local.make_directory(parent).await?;
        }
        self.local.write_file(&host, &contents).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryRemote;
    use bytes::Bytes;
    use std::path::Path;
    use treesync_fs::{FsError, MemoryFilesystem};

    const ROOT: &str = "/sync";

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    fn setup() -> (Arc<MemoryFilesystem>, Arc<MemoryRemote>) {
        (
            Arc::new(MemoryFilesystem::with_root(Path::new(ROOT))),
            Arc::new(MemoryRemote::new()),
        )
    }

    fn reconciler(
        local: &Arc<MemoryFilesystem>,
        remote: &Arc<MemoryRemote>,
        config: SyncConfig,
    ) -> Reconciler<MemoryFilesystem, MemoryRemote> {
        Reconciler::new(Arc::clone(local), Arc::clone(remote), config)
    }

    #[tokio::test]
    async fn test_local_only_is_pushed_once() {
        let (local, remote) = setup();
        local.insert_file(Path::new("/sync/a.txt"), "hello").unwrap();
        let r = reconciler(&local, &remote, SyncConfig::new(ROOT));

        let report = r.run().await.unwrap();
        assert_eq!(report.pushed, 1);
        assert_eq!(remote.file(&rel("a.txt")).await, Some(Bytes::from_static(b"hello")));

        let second = r.run().await.unwrap();
        assert_eq!(second.attempted(), 0);
        assert_eq!(remote.writes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remote_only_is_pulled_with_parents() {
        let (local, remote) = setup();
        remote.insert_file(rel("b.txt"), "world").await;
        remote.insert_file(rel("x/y/z.txt"), "deep").await;
        let r = reconciler(&local, &remote, SyncConfig::new(ROOT));

        let report = r.run().await.unwrap();
        assert_eq!(report.pulled, 2);
        assert_eq!(
            local.file(Path::new("/sync/b.txt")),
            Some(Bytes::from_static(b"world"))
        );
        assert_eq!(
            local.file(Path::new("/sync/x/y/z.txt")),
            Some(Bytes::from_static(b"deep"))
        );
        assert!(local.has_dir(Path::new("/sync/x/y")));
    }

    #[tokio::test]
    async fn test_changed_is_local_authoritative() {
        let (local, remote) = setup();
        local.insert_file(Path::new("/sync/f.txt"), "A").unwrap();
        remote.insert_file(rel("f.txt"), "B").await;
        let r = reconciler(&local, &remote, SyncConfig::new(ROOT));

        let report = r.run().await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.merged_back, 0);
        assert_eq!(remote.file(&rel("f.txt")).await, Some(Bytes::from_static(b"A")));
        assert_eq!(local.file(Path::new("/sync/f.txt")), Some(Bytes::from_static(b"A")));
    }

    fn concat_merge() -> MemoryRemote {
        MemoryRemote::new().with_merge(Box::new(|_, incoming, existing| {
            existing.map(|old| {
                let mut merged = old.to_vec();
                merged.extend_from_slice(b"+");
                merged.extend_from_slice(incoming);
                Bytes::from(merged)
            })
        }))
    }

    #[tokio::test]
    async fn test_merged_content_ignored_by_default() {
        let local = Arc::new(MemoryFilesystem::with_root(Path::new(ROOT)));
        let remote = Arc::new(concat_merge());
        local.insert_file(Path::new("/sync/f.txt"), "A").unwrap();
        remote.insert_file(rel("f.txt"), "B").await;

        let report = reconciler(&local, &remote, SyncConfig::new(ROOT))
            .run()
            .await
            .unwrap();
        assert_eq!(report.merged_back, 0);
        assert_eq!(local.file(Path::new("/sync/f.txt")), Some(Bytes::from_static(b"A")));
        assert_eq!(remote.file(&rel("f.txt")).await, Some(Bytes::from_static(b"B+A")));
    }

    #[tokio::test]
    async fn test_merged_content_accepted_when_enabled() {
        let local = Arc::new(MemoryFilesystem::with_root(Path::new(ROOT)));
        let remote = Arc::new(concat_merge());
        local.insert_file(Path::new("/sync/f.txt"), "A").unwrap();
        remote.insert_file(rel("f.txt"), "B").await;

        let config = SyncConfig::new(ROOT).with_remote_merge(true);
        let r = reconciler(&local, &remote, config);
        let report = r.run().await.unwrap();
        assert_eq!(report.merged_back, 1);
        assert_eq!(
            local.file(Path::new("/sync/f.txt")),
            Some(Bytes::from_static(b"B+A"))
        );

        let (local_tree, remote_tree, _) = r.plan().await.unwrap();
        assert!(verify_convergence(&local_tree, &remote_tree).is_converged());
    }

    #[tokio::test]
    async fn test_partial_failure_continues() {
        let (local, remote) = setup();
        local.insert_file(Path::new("/sync/ok.txt"), "1").unwrap();
        local.insert_file(Path::new("/sync/bad.txt"), "2").unwrap();
        remote.insert_file(rel("pull-ok.txt"), "3").await;
        remote.insert_file(rel("pull-bad.txt"), "4").await;
        remote.fail_writes_of(rel("bad.txt")).await;
        remote.fail_reads_of(rel("pull-bad.txt")).await;

        let err = reconciler(&local, &remote, SyncConfig::new(ROOT))
            .run()
            .await
            .unwrap_err();

        let report = err.report().expect("partial failure carries a report");
        assert_eq!(report.pushed, 1);
        assert_eq!(report.pulled, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.attempted(), 4);
        assert!(err.is_transient());

        let kinds: Vec<_> = report.failures.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&TransferKind::Push));
        assert!(kinds.contains(&TransferKind::Pull));
        assert_eq!(remote.file(&rel("ok.txt")).await, Some(Bytes::from_static(b"1")));
        assert!(local.file(Path::new("/sync/pull-ok.txt")).is_some());
    }

    #[tokio::test]
    async fn test_missing_root_is_structural() {
        let local = Arc::new(MemoryFilesystem::new());
        let remote = Arc::new(MemoryRemote::new());
        remote.insert_file(rel("a"), "1").await;

        let r = reconciler(&local, &remote, SyncConfig::new("/absent"));
        let err = r.run().await.unwrap_err();
        assert!(matches!(err, SyncError::Fs(FsError::RootMissing(_))));
        assert!(!err.is_transient());
        assert!(r.last_local_tree().is_none());
        assert!(remote.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_remote_keeps_last_known_good() {
        let (local, remote) = setup();
        local.insert_file(Path::new("/sync/a"), "1").unwrap();
        let r = reconciler(&local, &remote, SyncConfig::new(ROOT));
        r.run().await.unwrap();
        let good = r.last_local_tree().unwrap();

        remote.set_tree_unavailable(true).await;
        let err = r.run().await.unwrap_err();
        assert!(matches!(err, SyncError::Remote(_)));
        assert!(err.is_transient());
        assert_eq!(r.last_local_tree(), Some(good));
    }

    #[tokio::test]
    async fn test_ignored_files_never_transfer() {
        let (local, remote) = setup();
        local.insert_file(Path::new("/sync/.DS_Store"), "meta").unwrap();
        remote.insert_file(rel("Thumbs.db"), "meta").await;
        remote.insert_file(rel(".cache/blob"), "meta").await;
        let r = reconciler(&local, &remote, SyncConfig::new(ROOT));

        let (local_tree, remote_tree, plan) = r.plan().await.unwrap();
        assert!(local_tree.is_empty());
        assert!(remote_tree.is_empty());
        assert!(plan.is_empty());

        let report = r.run().await.unwrap();
        assert_eq!(report.attempted(), 0);
        assert!(local.file(Path::new("/sync/Thumbs.db")).is_none());
    }

    #[tokio::test]
    async fn test_verified_pass_reports_convergence() {
        let (local, remote) = setup();
        local.insert_file(Path::new("/sync/a.txt"), "hello").unwrap();
        remote.insert_file(rel("b.txt"), "world").await;

        let config = SyncConfig::new(ROOT).with_verify(true);
        let report = reconciler(&local, &remote, config).run().await.unwrap();
        assert_eq!(report.converged, Some(true));

        let unverified = reconciler(&local, &remote, SyncConfig::new(ROOT))
            .run()
            .await
            .unwrap();
        assert_eq!(unverified.converged, None);
    }

    #[tokio::test]
    async fn test_verified_pass_detects_rejected_merge() {
        let (local, _) = setup();
        let remote = Arc::new(MemoryRemote::new().with_merge(Box::new(|_, incoming, _| {
            let mut merged = incoming.to_vec();
            merged.extend_from_slice(b"+remote");
            Some(Bytes::from(merged))
        })));
        local.insert_file(Path::new("/sync/a.txt"), "local").unwrap();

        // Merged content stays remote-only, so the sides disagree afterwards.
        let config = SyncConfig::new(ROOT).with_verify(true);
        let r = reconciler(&local, &remote, config);
        let report = r.run().await.unwrap();
        assert_eq!(report.converged, Some(false));
        assert_eq!(
            r.verify().await.unwrap(),
            ConvergenceResult::Diverged {
                changed: 1,
                remote_only: 0,
                local_only: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_dry_run_transfers_nothing() {
        let (local, remote) = setup();
        local.insert_file(Path::new("/sync/a"), "1").unwrap();
        remote.insert_file(rel("b"), "2").await;

        let config = SyncConfig::new(ROOT).with_dry_run(true);
        let report = reconciler(&local, &remote, config).run().await.unwrap();
        assert!(report.dry_run);
        assert_eq!(
            report.planned,
            DiffSummary {
                changed: 0,
                remote_only: 1,
                local_only: 1,
            }
        );
        assert_eq!(report.attempted(), 0);
        assert!(remote.writes().await.is_empty());
        assert!(local.file(Path::new("/sync/b")).is_none());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        fn files() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
            let contents = prop::collection::vec(any::<u8>(), 0..16);
            prop::collection::btree_map("[a-f]{1,3}", contents, 0..8)
        }

        proptest! {
            #[test]
            fn test_single_pass_converges(local_files in files(), remote_files in files()) {
                let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
                runtime.block_on(async {
                    let (local, remote) = setup();
                    for (name, data) in &local_files {
                        let path = Path::new(ROOT).join(name);
                        local.insert_file(&path, data.clone()).unwrap();
                    }
                    for (name, data) in &remote_files {
                        remote.insert_file(rel(name), data.clone()).await;
                    }

                    let config = SyncConfig::new(ROOT).with_verify(true);
                    let report = reconciler(&local, &remote, config).run().await.unwrap();
                    let planned = &report.planned;
                    assert_eq!(
                        report.attempted(),
                        planned.changed + planned.remote_only + planned.local_only
                    );
                    assert_eq!(report.converged, Some(true));

                    for (name, data) in &local_files {
                        let expected = Some(Bytes::from(data.clone()));
                        assert_eq!(remote.file(&rel(name)).await, expected);
                    }
                });
            }
        }
    }
}
