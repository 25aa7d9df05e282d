//! Per-job local workspaces for remote inputs and outputs.
//!
//! A [`StagingContext`] owns a fresh directory under the work root. It is
//! created before anything is downloaded. Callers release it with
//! [`StagingContext::close`]; any path that skips that (errors, early
//! returns, panics) still reaches [`Drop`], which removes the staged files.

use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::store::{key_basename, ObjectStore};

#[derive(Debug)]
struct StagedOutput {
    path: PathBuf,
    key: String,
}

/// A job's local workspace.
#[derive(Debug)]
pub struct StagingContext {
    workspace: PathBuf,
    input_path: PathBuf,
    output: Option<StagedOutput>,
    extras: Vec<PathBuf>,
    keep_local: bool,
    closed: bool,
}

impl StagingContext {
    /// Create a workspace, download `remote_input` into it and reserve a local
    /// path for `remote_output`.
    pub async fn prepare(
        store: &dyn ObjectStore,
        work_root: &Path,
        remote_input: &str,
        remote_output: &str,
        keep_local: bool,
    ) -> StorageResult<Self> {
        let output_name = key_basename(remote_output)?;
        let mut ctx = Self::create(work_root, remote_input, keep_local).await?;

        ctx.output = Some(StagedOutput {
            path: ctx.workspace.join(output_name),
            key: remote_output.to_string(),
        });
        ctx.download_input(store, remote_input).await?;
        Ok(ctx)
    }

    /// Create a workspace holding only `remote_input`.
    pub async fn input_only(
        store: &dyn ObjectStore,
        work_root: &Path,
        remote_input: &str,
        keep_local: bool,
    ) -> StorageResult<Self> {
        let mut ctx = Self::create(work_root, remote_input, keep_local).await?;
        ctx.download_input(store, remote_input).await?;
        Ok(ctx)
    }

    async fn create(work_root: &Path, remote_input: &str, keep_local: bool) -> StorageResult<Self> {
        let input_name = key_basename(remote_input)?;

        tokio::fs::create_dir_all(work_root).await?;
        let workspace = work_root.join(format!("stage_{}", Uuid::new_v4().simple()));
        // create_dir (not create_dir_all) fails if the name is already taken
        tokio::fs::create_dir(&workspace).await?;
        debug!("Created workspace {}", workspace.display());

        Ok(Self {
            input_path: workspace.join(input_name),
            workspace,
            output: None,
            extras: Vec::new(),
            keep_local,
            closed: false,
        })
    }

    async fn download_input(&mut self, store: &dyn ObjectStore, key: &str) -> StorageResult<()> {
        info!("Staging {} -> {}", key, self.input_path.display());
        store.download(key, &self.input_path).await
    }

    /// Download an additional input into the workspace.
    ///
    /// A base name already used in the workspace gets a numeric prefix.
    pub async fn fetch(&mut self, store: &dyn ObjectStore, key: &str) -> StorageResult<PathBuf> {
        let name = key_basename(key)?;

        let mut path = self.workspace.join(name);
        let mut n = 1;
        while self.is_reserved(&path) {
            path = self.workspace.join(format!("{}_{}", n, name));
            n += 1;
        }

        self.extras.push(path.clone());
        info!("Staging {} -> {}", key, path.display());
        store.download(key, &path).await?;
        Ok(path)
    }

    fn is_reserved(&self, path: &Path) -> bool {
        path == self.input_path
            || self.output.as_ref().is_some_and(|o| o.path == path)
            || self.extras.iter().any(|e| e == path)
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Local path the job writes its result to, if it has one.
    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_ref().map(|o| o.path.as_path())
    }

    pub fn output_key(&self) -> Option<&str> {
        self.output.as_ref().map(|o| o.key.as_str())
    }

    /// Upload the local output. A missing or zero-byte output is never uploaded.
    pub async fn finish(&self, store: &dyn ObjectStore) -> StorageResult<()> {
        let Some(output) = &self.output else {
            debug!("No output staged in {}", self.workspace.display());
            return Ok(());
        };

        let metadata = match tokio::fs::metadata(&output.path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::OutputMissing(output.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.len() == 0 {
            return Err(StorageError::OutputEmpty(output.path.clone()));
        }

        store.upload(&output.path, &output.key).await?;
        info!(
            "Uploaded {} ({} bytes) to {}",
            output.path.display(),
            metadata.len(),
            output.key
        );
        Ok(())
    }

    fn staged_files(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.input_path)
            .chain(self.extras.iter())
            .chain(self.output.iter().map(|o| &o.path))
    }

    /// Remove the workspace without blocking the runtime.
    pub async fn close(mut self) {
        self.closed = true;
        if self.keep_local {
            info!("Keeping local workspace {}", self.workspace.display());
            return;
        }

        for file in self.staged_files() {
            match tokio::fs::remove_file(file).await {
                Ok(()) => debug!("Removed {}", file.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => error!("Failed to remove {}: {}", file.display(), e),
            }
        }

        if let Err(e) = tokio::fs::remove_dir_all(&self.workspace).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!(
                    "Failed to remove workspace {}: {}",
                    self.workspace.display(),
                    e
                );
            }
        }
    }

    fn cleanup(&self) {
        if self.keep_local {
            info!("Keeping local workspace {}", self.workspace.display());
            return;
        }

        for file in self.staged_files() {
            match std::fs::remove_file(file) {
                Ok(()) => debug!("Removed {}", file.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => error!("Failed to remove {}: {}", file.display(), e),
            }
        }

        if let Err(e) = std::fs::remove_dir_all(&self.workspace) {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!(
                    "Failed to remove workspace {}: {}",
                    self.workspace.display(),
                    e
                );
            }
        }
    }
}

impl Drop for StagingContext {
    fn drop(&mut self) {
        if !self.closed {
            self.cleanup();
        }
    }
}

/// Run `f` against staged local paths and upload its output on success.
///
/// `f` receives the local input and output paths. The workspace is removed
/// however `f` exits; a failing `f` never triggers an upload.
pub async fn stage<F, Fut, T, E>(
    store: &dyn ObjectStore,
    work_root: &Path,
    remote_input: &str,
    remote_output: &str,
    keep_local: bool,
    f: F,
) -> Result<T, E>
where
    F: FnOnce(PathBuf, PathBuf) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<StorageError>,
{
    let ctx =
        StagingContext::prepare(store, work_root, remote_input, remote_output, keep_local).await?;
    let output = ctx
        .output_path()
        .map(Path::to_path_buf)
        .ok_or_else(|| StorageError::OutputMissing(ctx.workspace().to_path_buf()))?;

    let value = f(ctx.input_path().to_path_buf(), output).await?;
    ctx.finish(store).await?;
    ctx.close().await;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use crate::store::FsObjectStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Filesystem store that records uploads.
    struct RecordingStore {
        inner: FsObjectStore,
        uploads: Mutex<Vec<String>>,
    }

    impl RecordingStore {
        fn new(root: &Path) -> Self {
            Self {
                inner: FsObjectStore::new(root),
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn put(&self, key: &str, data: &[u8]) {
            let path = self.inner.object_path(key).unwrap();
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
        }

        fn uploads(&self) -> Vec<String> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()> {
            self.inner.download(key, local_path).await
        }

        async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()> {
            self.uploads.lock().unwrap().push(key.to_string());
            self.inner.upload(local_path, key).await
        }
    }

    struct Fixture {
        _dir: TempDir,
        store: RecordingStore,
        work_root: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(&dir.path().join("bucket"));
        store.put("in/input.mp4", b"source");
        let work_root = dir.path().join("work");
        Fixture {
            _dir: dir,
            store,
            work_root,
        }
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_prepare_stages_input_only() {
        let fx = fixture();
        let ctx = StagingContext::prepare(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/result.mp4",
            false,
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(ctx.input_path()).unwrap(), b"source");
        assert_eq!(ctx.input_path().file_name().unwrap(), "input.mp4");
        let output = ctx.output_path().unwrap();
        assert_eq!(output.file_name().unwrap(), "result.mp4");
        assert!(!output.exists());

        let workspace = ctx.workspace().to_path_buf();
        assert!(workspace.starts_with(&fx.work_root));
        drop(ctx);
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_workspaces_are_unique() {
        let fx = fixture();
        let a = StagingContext::input_only(&fx.store, &fx.work_root, "in/input.mp4", false)
            .await
            .unwrap();
        let b = StagingContext::input_only(&fx.store, &fx.work_root, "in/input.mp4", false)
            .await
            .unwrap();
        assert_ne!(a.workspace(), b.workspace());
    }

    #[tokio::test]
    async fn test_download_failure_cleans_up() {
        let fx = fixture();
        let err = StagingContext::prepare(
            &fx.store,
            &fx.work_root,
            "in/missing.mp4",
            "out/r.mp4",
            false,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(entries(&fx.work_root), 0);
    }

    #[tokio::test]
    async fn test_missing_output_not_uploaded() {
        let fx = fixture();
        let ctx = StagingContext::prepare(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/r.mp4",
            false,
        )
        .await
        .unwrap();

        let err = assert_err!(ctx.finish(&fx.store).await);
        assert!(matches!(err, StorageError::OutputMissing(_)));
        assert!(fx.store.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_empty_output_not_uploaded() {
        let fx = fixture();
        let ctx = StagingContext::prepare(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/r.mp4",
            false,
        )
        .await
        .unwrap();
        std::fs::write(ctx.output_path().unwrap(), b"").unwrap();

        let err = assert_err!(ctx.finish(&fx.store).await);
        assert!(matches!(err, StorageError::OutputEmpty(_)));
        assert!(fx.store.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_finish_uploads_output() {
        let fx = fixture();
        let ctx = StagingContext::prepare(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/r.mp4",
            false,
        )
        .await
        .unwrap();
        std::fs::write(ctx.output_path().unwrap(), b"result").unwrap();

        assert_ok!(ctx.finish(&fx.store).await);
        assert_eq!(fx.store.uploads(), vec!["out/r.mp4".to_string()]);
        drop(ctx);
        assert_eq!(entries(&fx.work_root), 0);
    }

    #[tokio::test]
    async fn test_close_removes_workspace() {
        let fx = fixture();
        let mut ctx = StagingContext::prepare(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/r.mp4",
            false,
        )
        .await
        .unwrap();
        fx.store.put("extra/music.wav", b"audio");
        ctx.fetch(&fx.store, "extra/music.wav").await.unwrap();
        std::fs::write(ctx.output_path().unwrap(), b"result").unwrap();
        let workspace = ctx.workspace().to_path_buf();

        ctx.close().await;
        assert!(!workspace.exists());
        assert_eq!(entries(&fx.work_root), 0);
    }

    #[tokio::test]
    async fn test_close_honours_keep_local() {
        let fx = fixture();
        let ctx = StagingContext::prepare(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/r.mp4",
            true,
        )
        .await
        .unwrap();
        let input = ctx.input_path().to_path_buf();

        ctx.close().await;
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_keep_local_retains_workspace() {
        let fx = fixture();
        let ctx = StagingContext::prepare(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/r.mp4",
            true,
        )
        .await
        .unwrap();
        let input = ctx.input_path().to_path_buf();
        drop(ctx);
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_fetch_prefixes_colliding_names() {
        let fx = fixture();
        fx.store.put("other/input.mp4", b"second");
        fx.store.put("third/input.mp4", b"third");

        let mut ctx = StagingContext::input_only(&fx.store, &fx.work_root, "in/input.mp4", false)
            .await
            .unwrap();
        let second = ctx.fetch(&fx.store, "other/input.mp4").await.unwrap();
        let third = ctx.fetch(&fx.store, "third/input.mp4").await.unwrap();

        assert_eq!(second.file_name().unwrap(), "1_input.mp4");
        assert_eq!(third.file_name().unwrap(), "2_input.mp4");
        assert_eq!(std::fs::read(&third).unwrap(), b"third");

        drop(ctx);
        assert_eq!(entries(&fx.work_root), 0);
    }

    #[tokio::test]
    async fn test_stage_uploads_on_success() {
        let fx = fixture();
        let size = stage(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/r.mp4",
            false,
            |input, output| async move {
                let data = std::fs::read(&input)?;
                std::fs::write(&output, &data)?;
                Ok::<_, StorageError>(data.len())
            },
        )
        .await
        .unwrap();

        assert_eq!(size, 6);
        assert_eq!(fx.store.uploads(), vec!["out/r.mp4".to_string()]);
        assert_eq!(entries(&fx.work_root), 0);
    }

    #[tokio::test]
    async fn test_stage_caller_failure_skips_upload() {
        let fx = fixture();
        let result: Result<(), StorageError> = stage(
            &fx.store,
            &fx.work_root,
            "in/input.mp4",
            "out/r.mp4",
            false,
            |_, output| async move {
                std::fs::write(&output, b"partial")?;
                Err::<(), _>(StorageError::upload_failed("encoder blew up"))
            },
        )
        .await;

        assert!(result.is_err());
        assert!(fx.store.uploads().is_empty());
        assert_eq!(entries(&fx.work_root), 0);
    }
}
