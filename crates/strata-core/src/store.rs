//! Storage collaborator.
//!
//! The core never touches the filesystem directly; a [`DocumentStore`] supplies raw bytes on open
//! and accepts reconstructed text on save.

use crate::error::StoreError;
use std::path::{Path, PathBuf};

/// Loads and persists document contents.
pub trait DocumentStore {
    /// Read the raw bytes stored at `path`.
    fn load(&self, path: &Path) -> Result<Vec<u8>, StoreError>;

    /// Write `text` back to `path`.
    fn persist(&self, path: &Path, text: &str) -> Result<(), StoreError>;
}

/// [`DocumentStore`] backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsStore {
    root: Option<PathBuf>,
}

impl FsStore {
    /// Resolve paths as given.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl DocumentStore for FsStore {
    fn load(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        let resolved = self.resolve(path);
        std::fs::read(&resolved).map_err(|source| StoreError::Load {
            path: resolved,
            source,
        })
    }

    fn persist(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        let resolved = self.resolve(path);
        std::fs::write(&resolved, text).map_err(|source| StoreError::Persist {
            path: resolved,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::with_root(dir.path());

        store.persist(Path::new("a.txt"), "hello\n").unwrap();
        assert_eq!(store.load(Path::new("a.txt")).unwrap(), b"hello\n");
        assert!(dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new();
        let missing = dir.path().join("missing.txt");

        let err = store.load(&missing).unwrap_err();
        assert!(matches!(&err, StoreError::Load { path, .. } if *path == missing));
        assert!(err.to_string().contains("missing.txt"));
    }
}
