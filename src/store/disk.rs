use crate::core::ByteStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// `ByteStore` over the local filesystem. Parent directories are created on write.
#[derive(Debug, Clone, Default)]
pub struct FsByteStore;

impl FsByteStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ByteStore for FsByteStore {
    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))
    }

    async fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), len = bytes.len(), "Wrote cache file");
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to delete {}", path.display()))
    }

    async fn list_entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !fs::try_exists(dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let mut entries = fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_exists_list_delete() {
        let dir = tempdir().unwrap();
        let store = FsByteStore::new();
        let path = dir.path().join("nested").join("AAPL.png");

        assert!(!store.exists(&path).await.unwrap());

        store.write_all(&path, b"png-bytes").await.unwrap();
        assert!(store.exists(&path).await.unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");

        let entries = store.list_entries(&dir.path().join("nested")).await.unwrap();
        assert_eq!(entries, vec![path.clone()]);

        store.delete(&path).await.unwrap();
        assert!(!store.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let store = FsByteStore::new();
        let entries = store.list_entries(&dir.path().join("missing")).await.unwrap();
        assert!(entries.is_empty());
    }
}
