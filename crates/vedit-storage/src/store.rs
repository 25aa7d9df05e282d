//! The object store seam used by job staging.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::client::{content_type_for, S3Client};
use crate::error::{StorageError, StorageResult};

/// Remote object storage addressed by string keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy the object at `key` to `local_path`.
    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()>;

    /// Copy `local_path` to the object at `key`, replacing any existing object.
    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()>;
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        self.download_file(key, local_path).await
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        self.upload_file(local_path, key, content_type_for(local_path))
            .await
    }
}

/// Last path segment of an object key.
pub fn key_basename(key: &str) -> StorageResult<&str> {
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name),
        _ => Err(StorageError::invalid_key(key)),
    }
}

/// Object store backed by a local directory. Keys are relative paths.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create from `LOCAL_STORE_DIR`.
    pub fn from_env() -> StorageResult<Self> {
        std::env::var("LOCAL_STORE_DIR")
            .map(Self::new)
            .map_err(|_| StorageError::config_error("LOCAL_STORE_DIR not set"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `key`. Keys may not escape the root.
    pub fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        let source = self.object_path(key)?;
        if !tokio::fs::try_exists(&source).await? {
            return Err(StorageError::not_found(key));
        }

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, local_path)
            .await
            .map_err(|e| StorageError::download_failed(format!("{}: {}", key, e)))?;

        debug!("Copied {} to {}", source.display(), local_path.display());
        Ok(())
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        let target = self.object_path(key)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &target)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", key, e)))?;

        debug!("Copied {} to {}", local_path.display(), target.display());
        Ok(())
    }
}
