//! Shared data models for the vedit media worker.
//!
//! This crate provides Serde-serializable types for:
//! - Job requests and their per-task parameters
//! - Time value parsing
//! - Encoding configuration
//! - Task result values

pub mod encoding;
pub mod job;
pub mod output;
pub mod timestamp;

// Re-export common types
pub use encoding::EncodingConfig;
pub use job::{
    AddAudioParams, ConcatenateParams, JobId, JobRequest, MediaInfoParams, MediaLocation,
    RequestError, ResizeParams, TaskKind, TranscodeParams, TrimParams,
};
pub use output::{MediaInfo, TaskOutput, UNKNOWN};
pub use timestamp::{format_seconds, parse_time, TimeFormatError};
