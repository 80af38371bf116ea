//! Checksum tree construction.
//!
//! Walks a root directory through a [`LocalFilesystem`], fingerprinting
//! every regular file it finds. The walk uses an explicit stack of pending
//! directories, so traversal order is unspecified; the resulting tree is
//! the same regardless.

use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};
use treesync_core::{fingerprint_reader, ChecksumTree, IgnorePolicy, RelPath};

use crate::disk::is_temp_name;
use crate::error::{FsError, Result};
use crate::traits::LocalFilesystem;

/// Builds a [`ChecksumTree`] for a directory.
pub struct ChecksumTreeBuilder<'a, F: LocalFilesystem + ?Sized> {
    fs: &'a F,
    ignore: &'a IgnorePolicy,
}

impl<'a, F: LocalFilesystem + ?Sized> ChecksumTreeBuilder<'a, F> {
    pub fn new(fs: &'a F, ignore: &'a IgnorePolicy) -> Self {
        Self { fs, ignore }
    }

    /// Fingerprint every file under `root`.
    ///
    /// Fails if `root` is missing or not a directory, or if any listing or
    /// read fails. A partially built tree is never returned. Atomic-write
    /// temp files are skipped whatever the ignore policy says.
    pub async fn build(&self, root: &Path) -> Result<ChecksumTree> {
        match self.fs.is_dir(root).await {
            Ok(true) => {}
            Ok(false) => return Err(FsError::NotADirectory(root.to_path_buf())),
            Err(FsError::NotFound(_)) => return Err(FsError::RootMissing(root.to_path_buf())),
            Err(e) => return Err(e),
        }

        let mut tree = ChecksumTree::new();
        let mut pending: Vec<(PathBuf, Option<RelPath>)> = vec![(root.to_path_buf(), None)];

        while let Some((dir, prefix)) = pending.pop() {
            for entry in self.fs.list_directory(&dir).await? {
                if self.ignore.is_ignored(&entry.name) || is_temp_name(&entry.name) {
                    trace!(dir = %dir.display(), name = %entry.name, "ignoring entry");
                    continue;
                }

                let rel = match &prefix {
                    Some(parent) => parent.join(&entry.name),
                    None => RelPath::new(&entry.name),
                };
                let rel = match rel {
                    Ok(rel) => rel,
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "skipping unrepresentable entry");
                        continue;
                    }
                };

                let host = dir.join(&entry.name);
                if entry.is_dir {
                    pending.push((host, Some(rel)));
                } else {
                    let mut reader = self.fs.open_read(&host).await?;
                    let fingerprint = fingerprint_reader(&mut reader)
                        .await
                        .map_err(|e| FsError::io(&host, e))?;
                    tree.insert(rel, fingerprint);
                }
            }
        }

        debug!(root = %root.display(), files = tree.len(), "built checksum tree");
        Ok(tree)
    }
}
