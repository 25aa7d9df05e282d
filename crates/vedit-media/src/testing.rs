//! In-memory media engine for tests.
//!
//! Probes answer from a registered table and runs are recorded instead of
//! spawning FFmpeg. A successful run writes a small placeholder file at the
//! command's output path, like a real encode would.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::command::FfmpegCommand;
use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};
use crate::probe::MediaDescriptor;

/// Descriptor for a video-only file.
pub fn video_descriptor(width: u32, height: u32, duration: f64) -> MediaDescriptor {
    MediaDescriptor {
        duration: Some(duration),
        width: Some(width),
        height: Some(height),
        codec: Some("h264".to_string()),
        bit_rate: Some(40_000),
        size: Some(10_240),
        format_name: Some("mov,mp4,m4a,3gp,3g2,mj2".to_string()),
        has_audio: false,
    }
}

/// Descriptor for an audio-only file.
pub fn audio_descriptor(duration: f64) -> MediaDescriptor {
    MediaDescriptor {
        duration: Some(duration),
        bit_rate: Some(1_411_200),
        size: Some(352_844),
        format_name: Some("wav".to_string()),
        has_audio: true,
        ..Default::default()
    }
}

#[derive(Debug, Default)]
pub struct FakeEngine {
    media: Mutex<HashMap<PathBuf, MediaDescriptor>>,
    runs: Mutex<Vec<Vec<String>>>,
    failure: Option<String>,
    skip_output: bool,
    empty_output: bool,
    output_descriptor: Option<MediaDescriptor>,
    fallback: Option<MediaDescriptor>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the probe result for `path`.
    pub fn with_media(self, path: impl AsRef<Path>, descriptor: MediaDescriptor) -> Self {
        self.add_media(path, descriptor);
        self
    }

    pub fn add_media(&self, path: impl AsRef<Path>, descriptor: MediaDescriptor) {
        self.media
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), descriptor);
    }

    /// Make every run fail with the given diagnostic.
    pub fn failing(mut self, stderr: impl Into<String>) -> Self {
        self.failure = Some(stderr.into());
        self
    }

    /// Report success without writing the output file.
    pub fn without_output(mut self) -> Self {
        self.skip_output = true;
        self
    }

    /// Write zero-byte outputs.
    pub fn with_empty_output(mut self) -> Self {
        self.empty_output = true;
        self
    }

    /// Answer probes of unregistered files with `descriptor`.
    pub fn with_fallback(mut self, descriptor: MediaDescriptor) -> Self {
        self.fallback = Some(descriptor);
        self
    }

    /// Register `descriptor` for every output written by a run.
    pub fn producing(mut self, descriptor: MediaDescriptor) -> Self {
        self.output_descriptor = Some(descriptor);
        self
    }

    /// Arguments of every run so far.
    pub fn runs(&self) -> Vec<Vec<String>> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn probe(&self, path: &Path) -> MediaResult<MediaDescriptor> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        self.media
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| MediaError::FfprobeFailed {
                message: format!("FFprobe failed on {}", path.display()),
                stderr: Some("Invalid data found when processing input".to_string()),
            })
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.runs.lock().unwrap().push(cmd.build_args());

        if let Some(stderr) = &self.failure {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr.clone()),
                Some(1),
            ));
        }

        if !self.skip_output {
            let contents: &[u8] = if self.empty_output { b"" } else { b"encoded" };
            std::fs::write(cmd.output(), contents)?;
            if let Some(descriptor) = &self.output_descriptor {
                self.add_media(cmd.output(), descriptor.clone());
            }
        }
        Ok(())
    }
}
