//! Structured job logging utilities.
//!
//! Every handler receives a [`JobLogger`] so its log lines carry the job ID
//! and task name without a process-wide logger object.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vedit_models::{JobId, TaskKind};

use crate::error::JobError;

/// Install the global subscriber: JSON when `LOG_FORMAT=json`, colored text
/// otherwise. `RUST_LOG` directives are honored on top of `vedit=info`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "vedit=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    task: TaskKind,
}

impl JobLogger {
    pub fn new(job_id: &JobId, task: TaskKind) -> Self {
        Self {
            job_id: job_id.to_string(),
            task,
        }
    }

    /// Log the start of a job.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            task = %self.task,
            "Job started: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            task = %self.task,
            "Job warning: {}", message
        );
    }

    /// Log the completion of a job.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            task = %self.task,
            "Job completed: {}", message
        );
    }

    /// Convert `err` into a [`JobError`], logging it with its category.
    ///
    /// Engine diagnostics are logged separately at debug level.
    pub fn fail(&self, err: impl Into<JobError>) -> JobError {
        let err = err.into();
        error!(
            job_id = %self.job_id,
            task = %self.task,
            kind = err.kind(),
            "Job failed: {}", err
        );
        if let Some(diagnostic) = err.diagnostic() {
            tracing::debug!(job_id = %self.job_id, "Engine output:\n{}", diagnostic);
        }
        err
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            task = %self.task
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, TaskKind::Trim);

        assert_eq!(logger.job_id(), job_id.to_string());
        assert_eq!(logger.task(), TaskKind::Trim);
    }

    #[test]
    fn test_fail_keeps_category() {
        let logger = JobLogger::new(&JobId::from_string("job-1"), TaskKind::Resize);
        let err = logger.fail(JobError::value("no size"));
        assert_eq!(err.kind(), "value");
    }
}
