//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use vedit_models::EncodingConfig;

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Root directory for per-job staging workspaces
    pub work_dir: PathBuf,
    /// Leave staging workspaces on disk after each job
    pub keep_local: bool,
    /// Kill FFmpeg runs that exceed this
    pub ffmpeg_timeout: Option<Duration>,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// How often the worker should scan for orphaned pending jobs
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be claimed (crash recovery and retries)
    pub claim_min_idle: Duration,
    /// How often a running job refreshes its pending entry
    pub job_heartbeat_interval: Duration,
    /// Port for the Prometheus exporter; disabled when unset
    pub metrics_port: Option<u16>,
    /// Codecs for re-encoding operations
    pub encoding: EncodingConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            work_dir: PathBuf::from("/tmp/vedit"),
            keep_local: false,
            ffmpeg_timeout: Some(Duration::from_secs(3600)),
            shutdown_timeout: Duration::from_secs(30),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
            job_heartbeat_interval: Duration::from_secs(30),
            metrics_port: None,
            encoding: EncodingConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // FFMPEG_TIMEOUT_SECS=0 disables the timeout
        let ffmpeg_timeout = match env_parse::<u64>("FFMPEG_TIMEOUT_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.ffmpeg_timeout,
        };

        Self {
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            keep_local: env_flag("WORKER_KEEP_LOCAL").unwrap_or(defaults.keep_local),
            ffmpeg_timeout,
            shutdown_timeout: env_parse("WORKER_SHUTDOWN_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
            claim_interval: env_parse("WORKER_CLAIM_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_interval),
            claim_min_idle: env_parse("WORKER_CLAIM_MIN_IDLE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_min_idle),
            job_heartbeat_interval: env_parse("WORKER_JOB_HEARTBEAT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_heartbeat_interval),
            metrics_port: env_parse("METRICS_PORT"),
            encoding: EncodingConfig::from_env(),
        }
    }

    /// Heartbeat period in effect. Capped at half of `claim_min_idle` so a
    /// running job is always refreshed before it looks abandoned.
    pub fn heartbeat_interval(&self) -> Duration {
        self.job_heartbeat_interval
            .min(self.claim_min_idle / 2)
            .max(Duration::from_secs(1))
    }
}
