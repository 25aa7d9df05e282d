//! The media engine seam.
//!
//! Operations talk to FFmpeg only through [`MediaEngine`], so the worker can
//! inject a timeout policy and tests can substitute an in-memory engine.

use async_trait::async_trait;
use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_media, MediaDescriptor};

/// Probe and encode primitives provided by an external engine.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Read-only metadata query.
    async fn probe(&self, path: &Path) -> MediaResult<MediaDescriptor>;

    /// Run an encode to completion.
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()>;
}

/// Engine backed by the `ffmpeg` / `ffprobe` binaries on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill encodes that run longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, path: &Path) -> MediaResult<MediaDescriptor> {
        probe_media(path).await
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.runner.run(cmd).await
    }
}

/// Run `cmd` and confirm it left a non-empty output file.
///
/// Returns the output size in bytes. An engine that exits cleanly but writes
/// nothing, or writes zero bytes, is a failed encode.
pub async fn encode(engine: &dyn MediaEngine, cmd: &FfmpegCommand) -> MediaResult<u64> {
    engine.run(cmd).await?;

    let output = cmd.output();
    let size = tokio::fs::metadata(output)
        .await
        .map(|m| m.len())
        .map_err(|_| MediaError::MissingOutput(output.to_path_buf()))?;

    if size == 0 {
        return Err(MediaError::EmptyOutput(output.to_path_buf()));
    }
    Ok(size)
}
