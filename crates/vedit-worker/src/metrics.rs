//! Prometheus metrics for the worker.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "vedit_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vedit_jobs_failed_total";
    pub const JOBS_RETRIED_TOTAL: &str = "vedit_jobs_retried_total";
    pub const JOB_DURATION_SECONDS: &str = "vedit_job_duration_seconds";
}

/// Serve metrics on `0.0.0.0:port`. Must run inside the tokio runtime.
pub fn init_metrics(port: u16) -> WorkerResult<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::Metrics(e.to_string()))?;
    info!("Serving metrics on {}", addr);
    Ok(())
}

/// Record job completed.
pub fn record_job_completed(task: &str, duration_secs: f64) {
    let labels = [("task", task.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record job failed, by error category.
pub fn record_job_failed(task: &str, kind: &str, duration_secs: f64) {
    let labels = [("task", task.to_string()), ("kind", kind.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &[("task", task.to_string())]).record(duration_secs);
}

/// Record a job left pending for redelivery.
pub fn record_job_retried(task: &str) {
    let labels = [("task", task.to_string())];
    counter!(names::JOBS_RETRIED_TOTAL, &labels).increment(1);
}
