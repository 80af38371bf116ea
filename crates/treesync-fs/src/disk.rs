//! Disk-backed implementation of [`LocalFilesystem`] on `tokio::fs`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use crate::error::{FsError, Result};
use crate::traits::{DirEntry, FileReader, LocalFilesystem};

/// Suffix of the hidden temp file used for atomic writes.
pub const TEMP_SUFFIX: &str = ".treesync.tmp";

/// Whether `name` is an atomic-write temp file, possibly left by a crash.
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

/// The real filesystem.
///
/// Writes go to a hidden sibling temp file which is then renamed over the
/// target, so a crash mid-write never leaves a truncated file behind. Tree
/// building skips temp names regardless of the ignore policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFilesystem;

impl DiskFilesystem {
    pub fn new() -> Self {
        Self
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

#[async_trait]
impl LocalFilesystem for DiskFilesystem {
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| FsError::io(path, e))?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await.map_err(|e| FsError::io(path, e))? {
            let entry_path = entry.path();
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(name = ?raw, dir = %path.display(), "skipping entry with non UTF-8 name");
                    continue;
                }
            };

            let metadata = match tokio::fs::symlink_metadata(&entry_path).await {
                Ok(metadata) => metadata,
                // Removed since the listing was taken.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(FsError::io(&entry_path, e)),
            };

            // Links to files are followed. Links to directories are not, so a
            // walk can never cycle; unresolvable links (dangling, looping) are
            // skipped rather than failing the listing.
            let metadata = if metadata.file_type().is_symlink() {
                match tokio::fs::metadata(&entry_path).await {
                    Ok(target) if target.is_dir() => {
                        warn!(path = %entry_path.display(), "skipping symlink to directory");
                        continue;
                    }
                    Ok(target) => target,
                    Err(e) => {
                        warn!(
                            path = %entry_path.display(),
                            error = %e,
                            "skipping unresolvable symlink"
                        );
                        continue;
                    }
                }
            } else {
                metadata
            };

            if metadata.is_dir() {
                entries.push(DirEntry::dir(name));
            } else if metadata.is_file() {
                entries.push(DirEntry::file(name));
            }
        }

        Ok(entries)
    }

    async fn is_dir(&self, path: &Path) -> Result<bool> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FsError::io(path, e))?;
        Ok(metadata.is_dir())
    }

    async fn open_read(&self, path: &Path) -> Result<FileReader> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| FsError::io(path, e))?;
        Ok(Box::new(file))
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| FsError::io(path, e))?;
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.is_dir(path).await.unwrap_or(false) {
            return Err(FsError::IsADirectory(path.to_path_buf()));
        }

        let temp = temp_path_for(path);
        tokio::fs::write(&temp, contents)
            .await
            .map_err(|e| FsError::io(&temp, e))?;

        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(FsError::io(path, e));
        }
        Ok(())
    }

    async fn make_directory(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| FsError::io(path, e))?;

        if !self.is_dir(path).await? {
            return Err(FsError::NotADirectory(path.to_path_buf()));
        }
        Ok(())
    }
}
