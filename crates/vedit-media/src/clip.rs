//! Clip handles.
//!
//! A [`Clip`] is an opened media file: the file handle plus its probed
//! descriptor. The handle is released by [`Clip::close`] or, on every other
//! path, when the clip is dropped.

use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};
use crate::probe::MediaDescriptor;

#[derive(Debug)]
pub struct Clip {
    path: PathBuf,
    descriptor: MediaDescriptor,
    file: Option<File>,
}

impl Clip {
    /// Open a media file and probe it.
    pub async fn open(engine: &dyn MediaEngine, path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MediaError::FileNotFound(path.to_path_buf()),
            _ => MediaError::Io(e),
        })?;

        // If the probe fails the file handle is dropped with this frame.
        let descriptor = engine.probe(path).await?;

        debug!("Opened clip {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            descriptor,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn descriptor(&self) -> &MediaDescriptor {
        &self.descriptor
    }

    /// Video dimensions, failing for files without a video stream.
    pub fn dimensions(&self) -> MediaResult<(u32, u32)> {
        self.descriptor
            .dimensions()
            .ok_or_else(|| MediaError::NoVideoStream(self.path.clone()))
    }

    /// Duration in seconds, failing when the container does not report one.
    pub fn duration(&self) -> MediaResult<f64> {
        self.descriptor
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| {
                MediaError::invalid_media(format!("{} reports no duration", self.path.display()))
            })
    }

    pub fn has_audio(&self) -> bool {
        self.descriptor.has_audio
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Release the underlying file handle.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.file.take().is_some() {
            debug!("Released clip {}", self.path.display());
        }
    }
}

impl Drop for Clip {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{video_descriptor, FakeEngine};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_reads_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.mp4");
        std::fs::write(&path, b"x").unwrap();

        let engine = FakeEngine::new().with_media(&path, video_descriptor(320, 240, 2.0));
        let clip = Clip::open(&engine, &path).await.unwrap();

        assert!(clip.is_open());
        assert_eq!(clip.dimensions().unwrap(), (320, 240));
        assert_eq!(clip.duration().unwrap(), 2.0);
        assert!(!clip.has_audio());
        clip.close();
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let engine = FakeEngine::new();
        let err = Clip::open(&engine, "/nope/missing.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_probe_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"x").unwrap();

        // Unknown to the fake engine, so the probe fails.
        let engine = FakeEngine::new();
        let err = Clip::open(&engine, &path).await.unwrap_err();
        assert!(matches!(err, MediaError::FfprobeFailed { .. }));
    }

    #[tokio::test]
    async fn test_audio_only_has_no_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, b"x").unwrap();

        let engine =
            FakeEngine::new().with_media(&path, crate::testing::audio_descriptor(3.0));
        let clip = Clip::open(&engine, &path).await.unwrap();
        assert!(matches!(clip.dimensions(), Err(MediaError::NoVideoStream(_))));
        assert!(clip.has_audio());
    }
}
