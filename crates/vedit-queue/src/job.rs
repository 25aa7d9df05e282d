//! Queued job envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vedit_models::{JobId, JobRequest, TaskKind};

/// A job request as it travels through the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJob {
    /// Unique job ID
    pub job_id: JobId,
    /// What to do
    pub request: JobRequest,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// Leave the staging workspace on disk after the job (debugging)
    #[serde(default)]
    pub keep_local: bool,
}

impl QueueJob {
    /// Wrap a request with a fresh job ID.
    pub fn new(request: JobRequest) -> Self {
        Self {
            job_id: JobId::new(),
            request,
            created_at: Utc::now(),
            keep_local: false,
        }
    }

    pub fn with_keep_local(mut self, keep_local: bool) -> Self {
        self.keep_local = keep_local;
        self
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn kind(&self) -> TaskKind {
        self.request.kind()
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("{}:{}", self.kind(), self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vedit_models::{MediaInfoParams, MediaLocation};

    fn media_info_job() -> QueueJob {
        QueueJob::new(JobRequest::MediaInfo(MediaInfoParams {
            input: MediaLocation::remote("in/a.mp4"),
        }))
    }

    #[test]
    fn test_idempotency_key() {
        let job = media_info_job();
        assert_eq!(
            job.idempotency_key(),
            format!("media_info:{}", job.job_id())
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let job = media_info_job().with_keep_local(true);
        let json = serde_json::to_string(&job).expect("serialize QueueJob");
        let decoded: QueueJob = serde_json::from_str(&json).expect("deserialize QueueJob");
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_keep_local_defaults_off() {
        let json = serde_json::json!({
            "job_id": "abc",
            "request": {"task": "media_info", "input": {"local": "/a.mp4"}},
            "created_at": "2024-01-01T00:00:00Z"
        });
        let job: QueueJob = serde_json::from_value(json).unwrap();
        assert!(!job.keep_local);
        assert_eq!(job.job_id().as_str(), "abc");
    }
}
