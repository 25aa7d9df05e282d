//! FFmpeg CLI wrapper for the vedit media operations.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a timeout-aware runner
//! - FFprobe parsing into [`MediaDescriptor`]
//! - The [`MediaEngine`] seam used by every operation
//! - Clip handles and the multi-input compatibility check
//! - Transcode, resize, trim, concatenate, add-audio and media-info operations

pub mod audio;
pub mod clip;
pub mod command;
pub mod compat;
pub mod concat;
pub mod engine;
pub mod error;
pub mod info;
pub mod probe;
pub mod resize;
pub mod transcode;
pub mod trim;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use audio::{add_audio, AudioMixOptions, AudioPlan};
pub use clip::Clip;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compat::check_compatibility;
pub use concat::{concatenate, ConcatSummary, SegmentAudio};
pub use engine::{encode, FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use info::{media_info, summarize};
pub use probe::{probe_media, MediaDescriptor};
pub use resize::{resize, ScaleTarget};
pub use transcode::transcode;
pub use trim::{trim, TrimRange};
