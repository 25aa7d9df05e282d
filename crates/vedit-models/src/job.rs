//! Job request definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a job input or output lives.
///
/// Serialized as `{"local": "/path/in.mp4"}` or `{"remote": "videos/in.mp4"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaLocation {
    /// Path on the worker's filesystem
    Local(PathBuf),
    /// Object key in the configured bucket
    Remote(String),
}

impl MediaLocation {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local(path.into())
    }

    pub fn remote(key: impl Into<String>) -> Self {
        Self::Remote(key.into())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, MediaLocation::Remote(_))
    }

    pub fn as_local(&self) -> Option<&Path> {
        match self {
            MediaLocation::Local(p) => Some(p),
            MediaLocation::Remote(_) => None,
        }
    }

    pub fn as_remote(&self) -> Option<&str> {
        match self {
            MediaLocation::Remote(k) => Some(k),
            MediaLocation::Local(_) => None,
        }
    }
}

impl fmt::Display for MediaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaLocation::Local(p) => write!(f, "{}", p.display()),
            MediaLocation::Remote(k) => write!(f, "remote:{}", k),
        }
    }
}

/// Kinds of task the worker can execute, addressed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Transcode,
    Resize,
    MediaInfo,
    Trim,
    Concatenate,
    AddAudio,
}

impl TaskKind {
    /// Every registered task kind.
    pub const ALL: [TaskKind; 6] = [
        TaskKind::Transcode,
        TaskKind::Resize,
        TaskKind::MediaInfo,
        TaskKind::Trim,
        TaskKind::Concatenate,
        TaskKind::AddAudio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Transcode => "transcode",
            TaskKind::Resize => "resize",
            TaskKind::MediaInfo => "media_info",
            TaskKind::Trim => "trim",
            TaskKind::Concatenate => "concatenate",
            TaskKind::AddAudio => "add_audio",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| RequestError::UnknownTask(s.to_string()))
    }
}

/// Problems with a job request detected before any work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Invalid parameters for {task}: {message}")]
    InvalidParameters { task: TaskKind, message: String },

    #[error("Concatenate requires at least one input")]
    NoInputs,

    #[error("Mixed locations: {0}")]
    MixedLocations(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f64 {
    1.0
}

/// Re-encode a file into another container format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeParams {
    pub input: MediaLocation,
    pub output: MediaLocation,
    /// FFmpeg muxer name (e.g., "webm", "mp4")
    pub target_format: String,
}

/// Scale the video stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeParams {
    pub input: MediaLocation,
    pub output: MediaLocation,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default = "default_true")]
    pub keep_aspect_ratio: bool,
}

/// Probe a file and summarise it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfoParams {
    pub input: MediaLocation,
}

/// Extract a time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimParams {
    pub input: MediaLocation,
    pub output: MediaLocation,
    pub start_time: String,
    pub end_time: String,
}

/// Join videos of identical dimensions, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatenateParams {
    pub inputs: Vec<MediaLocation>,
    pub output: MediaLocation,
}

/// Replace or mix in an audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddAudioParams {
    pub video: MediaLocation,
    pub audio: MediaLocation,
    pub output: MediaLocation,
    /// Gain applied to the new track (1.0 = unchanged)
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Repeat the new track when it is shorter than the video
    #[serde(default)]
    pub loop_audio: bool,
    /// Mix the video's own audio underneath the new track
    #[serde(default)]
    pub keep_original_audio: bool,
    /// Gain applied to the original track when mixing
    #[serde(default)]
    pub original_audio_volume: f64,
}

/// A single media job, one variant per task kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum JobRequest {
    Transcode(TranscodeParams),
    Resize(ResizeParams),
    MediaInfo(MediaInfoParams),
    Trim(TrimParams),
    Concatenate(ConcatenateParams),
    AddAudio(AddAudioParams),
}

impl JobRequest {
    /// Build a request from a task name and its JSON parameters.
    pub fn from_parts(name: &str, params: serde_json::Value) -> Result<Self, RequestError> {
        fn params_for<T: serde::de::DeserializeOwned>(
            kind: TaskKind,
            params: serde_json::Value,
        ) -> Result<T, RequestError> {
            serde_json::from_value(params).map_err(|e| RequestError::InvalidParameters {
                task: kind,
                message: e.to_string(),
            })
        }

        let kind: TaskKind = name.parse()?;
        Ok(match kind {
            TaskKind::Transcode => JobRequest::Transcode(params_for(kind, params)?),
            TaskKind::Resize => JobRequest::Resize(params_for(kind, params)?),
            TaskKind::MediaInfo => JobRequest::MediaInfo(params_for(kind, params)?),
            TaskKind::Trim => JobRequest::Trim(params_for(kind, params)?),
            TaskKind::Concatenate => JobRequest::Concatenate(params_for(kind, params)?),
            TaskKind::AddAudio => JobRequest::AddAudio(params_for(kind, params)?),
        })
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            JobRequest::Transcode(_) => TaskKind::Transcode,
            JobRequest::Resize(_) => TaskKind::Resize,
            JobRequest::MediaInfo(_) => TaskKind::MediaInfo,
            JobRequest::Trim(_) => TaskKind::Trim,
            JobRequest::Concatenate(_) => TaskKind::Concatenate,
            JobRequest::AddAudio(_) => TaskKind::AddAudio,
        }
    }

    /// The input that is staged first for remote jobs.
    pub fn primary_input(&self) -> Option<&MediaLocation> {
        match self {
            JobRequest::Transcode(p) => Some(&p.input),
            JobRequest::Resize(p) => Some(&p.input),
            JobRequest::MediaInfo(p) => Some(&p.input),
            JobRequest::Trim(p) => Some(&p.input),
            JobRequest::Concatenate(p) => p.inputs.first(),
            JobRequest::AddAudio(p) => Some(&p.video),
        }
    }

    /// Inputs after the primary one.
    pub fn secondary_inputs(&self) -> Vec<&MediaLocation> {
        match self {
            JobRequest::Concatenate(p) => p.inputs.iter().skip(1).collect(),
            JobRequest::AddAudio(p) => vec![&p.audio],
            _ => Vec::new(),
        }
    }

    /// The output location, if the task writes one.
    pub fn output(&self) -> Option<&MediaLocation> {
        match self {
            JobRequest::Transcode(p) => Some(&p.output),
            JobRequest::Resize(p) => Some(&p.output),
            JobRequest::MediaInfo(_) => None,
            JobRequest::Trim(p) => Some(&p.output),
            JobRequest::Concatenate(p) => Some(&p.output),
            JobRequest::AddAudio(p) => Some(&p.output),
        }
    }

    /// Whether this job needs a staging workspace.
    ///
    /// Jobs with an output are remote when the output is remote; probe-only
    /// jobs are remote when their input is.
    pub fn is_remote(&self) -> bool {
        match self.output() {
            Some(output) => output.is_remote(),
            None => self.primary_input().is_some_and(MediaLocation::is_remote),
        }
    }

    /// Check location consistency and basic parameter sanity.
    pub fn validate(&self) -> Result<(), RequestError> {
        let primary = self.primary_input().ok_or(RequestError::NoInputs)?;

        if self.is_remote() {
            if !primary.is_remote() {
                return Err(RequestError::MixedLocations(format!(
                    "remote output requires a remote primary input, got {}",
                    primary
                )));
            }
        } else if let Some(remote) = std::iter::once(primary)
            .chain(self.secondary_inputs())
            .find(|loc| loc.is_remote())
        {
            return Err(RequestError::MixedLocations(format!(
                "{} requires a remote output",
                remote
            )));
        }

        if let JobRequest::AddAudio(p) = self {
            if !(p.volume.is_finite() && p.volume >= 0.0)
                || !(p.original_audio_volume.is_finite() && p.original_audio_volume >= 0.0)
            {
                return Err(RequestError::InvalidParameter(
                    "volume must be a non-negative number".to_string(),
                ));
            }
        }

        if let JobRequest::Transcode(p) = self {
            if p.target_format.trim().is_empty() {
                return Err(RequestError::InvalidParameter(
                    "target_format must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
