//! Worker error types.
//!
//! [`JobError`] is what a job handler fails with; its category decides
//! whether the executor retries the job or dead-letters it. [`WorkerError`]
//! covers the worker's own infrastructure.

use thiserror::Error;

use vedit_media::MediaError;
use vedit_models::{RequestError, TimeFormatError};
use vedit_storage::StorageError;

pub type JobResult<T> = Result<T, JobError>;
pub type WorkerResult<T> = Result<T, WorkerError>;

/// A failed job, by category.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid value: {0}")]
    Value(String),

    #[error("Incompatible inputs: {0}")]
    Compatibility(String),

    #[error("Processing failed: {message}")]
    Processing {
        message: String,
        /// Engine diagnostic output, when there is any
        diagnostic: Option<String>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl JobError {
    pub fn value(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
            diagnostic: None,
        }
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Stable category name, used for metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::NotFound(_) => "not_found",
            JobError::Value(_) => "value",
            JobError::Compatibility(_) => "compatibility",
            JobError::Processing { .. } => "processing",
            JobError::Storage(_) => "storage",
            JobError::Unexpected(_) => "unexpected",
        }
    }

    /// Check if error is retryable. Only storage transport failures are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Storage(_))
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            JobError::Processing { diagnostic, .. } => diagnostic.as_deref(),
            _ => None,
        }
    }
}

impl From<MediaError> for JobError {
    fn from(err: MediaError) -> Self {
        let message = err.to_string();
        match err {
            MediaError::FileNotFound(_) => JobError::NotFound(message),
            MediaError::DimensionMismatch { .. } => JobError::Compatibility(message),
            MediaError::EmptyInput(_) | MediaError::InvalidParameter(_) => JobError::Value(message),
            MediaError::FfmpegFailed { stderr, .. } | MediaError::FfprobeFailed { stderr, .. } => {
                JobError::Processing {
                    message,
                    diagnostic: stderr,
                }
            }
            MediaError::NoVideoStream(_)
            | MediaError::InvalidMedia(_)
            | MediaError::MissingOutput(_)
            | MediaError::EmptyOutput(_)
            | MediaError::Timeout(_) => JobError::processing(message),
            MediaError::FfmpegNotFound
            | MediaError::FfprobeNotFound
            | MediaError::Io(_)
            | MediaError::JsonParse(_)
            | MediaError::Internal(_) => JobError::Unexpected(message),
        }
    }
}

impl From<StorageError> for JobError {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        match err {
            StorageError::NotFound(_) | StorageError::OutputMissing(_) => {
                JobError::NotFound(message)
            }
            StorageError::InvalidKey(_) => JobError::Value(message),
            StorageError::OutputEmpty(_) => JobError::processing(message),
            _ => JobError::Storage(message),
        }
    }
}

impl From<TimeFormatError> for JobError {
    fn from(err: TimeFormatError) -> Self {
        JobError::Value(err.to_string())
    }
}

impl From<RequestError> for JobError {
    fn from(err: RequestError) -> Self {
        JobError::Value(err.to_string())
    }
}

/// Infrastructure failures of the worker itself.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] vedit_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }
}
