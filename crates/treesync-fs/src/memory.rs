//! In-memory implementation of [`LocalFilesystem`].
//!
//! This is primarily for testing. It mirrors disk semantics (writes need an
//! existing parent, directories and files cannot share a path) and supports
//! injecting read failures for chosen files.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{FsError, Result};
use crate::traits::{DirEntry, FileReader, LocalFilesystem};

/// In-memory filesystem. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryFilesystem {
    inner: RwLock<MemoryFsInner>,
}

#[derive(Default)]
struct MemoryFsInner {
    files: BTreeMap<PathBuf, Bytes>,
    dirs: BTreeSet<PathBuf>,
    failing_reads: BTreeSet<PathBuf>,
}

impl MemoryFsInner {
    fn add_dir_all(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl MemoryFilesystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem with `root` (and its ancestors) as directories.
    pub fn with_root(root: &Path) -> Self {
        let fs = Self::new();
        if let Ok(mut inner) = fs.inner.write() {
            inner.add_dir_all(root);
        }
        fs
    }

    /// Seed a file, creating its parent directories.
    pub fn insert_file(&self, path: &Path, contents: impl Into<Bytes>) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| FsError::Poisoned)?;
        if let Some(parent) = path.parent() {
            inner.add_dir_all(parent);
        }
        inner.files.insert(path.to_path_buf(), contents.into());
        Ok(())
    }

    /// Contents of a file, if present.
    pub fn file(&self, path: &Path) -> Option<Bytes> {
        self.inner.read().ok()?.files.get(path).cloned()
    }

    /// Whether `path` is a known directory.
    pub fn has_dir(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.dirs.contains(path))
            .unwrap_or(false)
    }

    /// Number of stored files.
    pub fn file_count(&self) -> usize {
        self.inner.read().map(|inner| inner.files.len()).unwrap_or(0)
    }

    /// Make every subsequent read of `path` fail with an I/O error.
    pub fn fail_reads_of(&self, path: &Path) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| FsError::Poisoned)?;
        inner.failing_reads.insert(path.to_path_buf());
        Ok(())
    }

    fn read_bytes(&self, path: &Path) -> Result<Bytes> {
        let inner = self.inner.read().map_err(|_| FsError::Poisoned)?;
        if inner.failing_reads.contains(path) {
            return Err(FsError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, "injected read failure"),
            });
        }
        if inner.dirs.contains(path) {
            return Err(FsError::IsADirectory(path.to_path_buf()));
        }
        inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }
}

#[async_trait]
impl LocalFilesystem for MemoryFilesystem {
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let inner = self.inner.read().map_err(|_| FsError::Poisoned)?;

        if !inner.dirs.contains(path) {
            if inner.files.contains_key(path) {
                return Err(FsError::NotADirectory(path.to_path_buf()));
            }
            return Err(FsError::NotFound(path.to_path_buf()));
        }

        let name_of = |child: &Path| {
            child
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        };

        let dirs = inner
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(path))
            .filter_map(|d| name_of(d).map(DirEntry::dir));
        let files = inner
            .files
            .keys()
            .filter(|f| f.parent() == Some(path))
            .filter_map(|f| name_of(f).map(DirEntry::file));

        Ok(dirs.chain(files).collect())
    }

    async fn is_dir(&self, path: &Path) -> Result<bool> {
        let inner = self.inner.read().map_err(|_| FsError::Poisoned)?;
        if inner.dirs.contains(path) {
            Ok(true)
        } else if inner.files.contains_key(path) {
            Ok(false)
        } else {
            Err(FsError::NotFound(path.to_path_buf()))
        }
    }

    async fn open_read(&self, path: &Path) -> Result<FileReader> {
        let data = self.read_bytes(path)?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        self.read_bytes(path)
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| FsError::Poisoned)?;

        if inner.dirs.contains(path) {
            return Err(FsError::IsADirectory(path.to_path_buf()));
        }
        match path.parent() {
            Some(parent) if inner.dirs.contains(parent) => {}
            Some(parent) => return Err(FsError::NotFound(parent.to_path_buf())),
            None => return Err(FsError::NotFound(path.to_path_buf())),
        }

        inner
            .files
            .insert(path.to_path_buf(), Bytes::copy_from_slice(contents));
        Ok(())
    }

    async fn make_directory(&self, path: &Path) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| FsError::Poisoned)?;

        if let Some(file) = path.ancestors().find(|a| inner.files.contains_key(*a)) {
            return Err(FsError::NotADirectory(file.to_path_buf()));
        }
        inner.add_dir_all(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_requires_parent() {
        let fs = MemoryFilesystem::with_root(Path::new("/root"));
        let nested = Path::new("/root/a/b.txt");

        assert!(matches!(
            fs.write_file(nested, b"x").await,
            Err(FsError::NotFound(_))
        ));

        fs.make_directory(Path::new("/root/a")).await.unwrap();
        fs.write_file(nested, b"x").await.unwrap();
        assert_eq!(fs.file(nested), Some(Bytes::from_static(b"x")));
    }

    #[tokio::test]
    async fn test_list_directory() {
        let fs = MemoryFilesystem::with_root(Path::new("/r"));
        fs.insert_file(Path::new("/r/a.txt"), "1").unwrap();
        fs.insert_file(Path::new("/r/d/b.txt"), "2").unwrap();

        let mut entries = fs.list_directory(Path::new("/r")).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries, vec![DirEntry::file("a.txt"), DirEntry::dir("d")]);

        assert!(matches!(
            fs.list_directory(Path::new("/r/a.txt")).await,
            Err(FsError::NotADirectory(_))
        ));
        assert!(matches!(
            fs.list_directory(Path::new("/missing")).await,
            Err(FsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_make_directory_idempotent_and_blocked_by_file() {
        let fs = MemoryFilesystem::with_root(Path::new("/r"));
        fs.make_directory(Path::new("/r/x/y")).await.unwrap();
        fs.make_directory(Path::new("/r/x/y")).await.unwrap();
        assert!(fs.has_dir(Path::new("/r/x")));

        fs.insert_file(Path::new("/r/f"), "data").unwrap();
        assert!(matches!(
            fs.make_directory(Path::new("/r/f/g")).await,
            Err(FsError::NotADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let fs = MemoryFilesystem::with_root(Path::new("/r"));
        fs.insert_file(Path::new("/r/a"), "1").unwrap();
        fs.fail_reads_of(Path::new("/r/a")).unwrap();

        assert!(matches!(
            fs.read_file(Path::new("/r/a")).await,
            Err(FsError::Io { .. })
        ));
        assert!(fs.open_read(Path::new("/r/a")).await.is_err());
    }
}
