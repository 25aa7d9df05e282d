//! Job executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vedit_models::JobId;
use vedit_queue::{JobQueue, QueueJob};

use crate::config::WorkerConfig;
use crate::dispatch::Dispatcher;
use crate::error::{JobError, WorkerError, WorkerResult};
use crate::metrics;
use crate::retry::{retry_async, FailureTracker, RetryConfig};

/// What happens to a failed job's queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Leave the entry pending; it is claimed again once idle.
    Retry { attempt: u32 },
    /// Move the entry to the dead-letter stream.
    DeadLetter,
}

impl FailureAction {
    /// Decide the fate of a failed job. `attempts` counts this failure.
    pub fn decide(err: &JobError, attempts: u32, max_retries: u32) -> Self {
        if err.is_retryable() && attempts < max_retries {
            FailureAction::Retry { attempt: attempts }
        } else {
            FailureAction::DeadLetter
        }
    }
}

/// Whether a job's staging workspace is left on disk.
fn keep_workspace(worker_default: bool, job: &QueueJob) -> bool {
    worker_default || job.keep_local
}

/// State shared by every spawned job task.
struct JobRunner {
    dispatcher: Arc<Dispatcher>,
    queue: Arc<JobQueue>,
    consumer_name: String,
    heartbeat_interval: Duration,
    keep_local: bool,
}

impl JobRunner {
    /// Keep `message_id` owned by this consumer while its job runs.
    fn spawn_heartbeat(&self, message_id: &str, job_id: &JobId) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let consumer_name = self.consumer_name.clone();
        let message_id = message_id.to_string();
        let job_id = job_id.clone();
        let period = self.heartbeat_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                match queue.heartbeat(&consumer_name, &message_id).await {
                    Ok(true) => debug!(job_id = %job_id, "Refreshed pending entry {}", message_id),
                    Ok(false) => {
                        warn!(
                            job_id = %job_id,
                            "Entry {} is no longer pending for this worker",
                            message_id
                        );
                        break;
                    }
                    Err(e) => warn!(job_id = %job_id, "Heartbeat failed: {}", e),
                }
            }
        })
    }

    /// Execute a single job, then ack, retry or dead-letter it.
    async fn execute_job(&self, message_id: String, job: QueueJob) {
        let queue = &self.queue;
        let job_id = job.job_id().clone();
        let task = job.kind().as_str();
        let started = Instant::now();

        let heartbeat = self.spawn_heartbeat(&message_id, &job_id);
        let result = self
            .dispatcher
            .execute(&job_id, &job.request, keep_workspace(self.keep_local, &job))
            .await;
        heartbeat.abort();
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(output) => {
                metrics::record_job_completed(task, elapsed);
                info!(
                    job_id = %job_id,
                    "Job finished in {:.2}s with {}",
                    elapsed,
                    serde_json::to_string(&output).unwrap_or_default()
                );

                let ack = RetryConfig::new("ack");
                if let Err(e) = retry_async(&ack, || queue.ack(&message_id)).await {
                    error!(job_id = %job_id, "Failed to ack job: {}", e);
                }
                if let Err(e) = queue.clear_dedup(&job).await {
                    warn!(job_id = %job_id, "Failed to clear dedup key: {}", e);
                }
            }
            Err(e) => {
                metrics::record_job_failed(task, e.kind(), elapsed);

                let attempts = if e.is_retryable() {
                    match queue.increment_retry(&message_id).await {
                        Ok(n) => n,
                        Err(retry_err) => {
                            warn!(job_id = %job_id, "Failed to count retry: {}", retry_err);
                            queue.max_retries()
                        }
                    }
                } else {
                    1
                };

                match FailureAction::decide(&e, attempts, queue.max_retries()) {
                    FailureAction::Retry { attempt } => {
                        metrics::record_job_retried(task);
                        info!(
                            job_id = %job_id,
                            "Job will be retried (attempt {}/{})",
                            attempt,
                            queue.max_retries()
                        );
                    }
                    FailureAction::DeadLetter => {
                        let reason = format!("{}: {}", e.kind(), e);
                        let dlq = RetryConfig::new("dead-letter");
                        if let Err(dlq_err) =
                            retry_async(&dlq, || queue.dlq(&message_id, &job, &reason)).await
                        {
                            error!(job_id = %job_id, "Failed to move job to DLQ: {}", dlq_err);
                        }
                        if let Err(e) = queue.clear_dedup(&job).await {
                            warn!(job_id = %job_id, "Failed to clear dedup key: {}", e);
                        }
                    }
                }
            }
        }
    }
}

/// Job executor that processes jobs from the queue.
pub struct JobExecutor {
    config: WorkerConfig,
    runner: Arc<JobRunner>,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, queue: JobQueue, dispatcher: Dispatcher) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = watch::channel(false);

        let runner = Arc::new(JobRunner {
            dispatcher: Arc::new(dispatcher),
            queue: Arc::new(queue),
            consumer_name: format!("worker-{}", Uuid::new_v4()),
            heartbeat_interval: config.heartbeat_interval(),
            keep_local: config.keep_local,
        });

        Self {
            config,
            runner,
            job_semaphore,
            shutdown,
        }
    }

    pub fn consumer_name(&self) -> &str {
        &self.runner.consumer_name
    }

    /// Run until [`shutdown`](Self::shutdown) is called, then drain in-flight jobs.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs, heartbeat every {:?}",
            self.runner.consumer_name,
            self.config.max_concurrent_jobs,
            self.runner.heartbeat_interval
        );

        self.runner.queue.init().await?;
        tokio::fs::create_dir_all(self.runner.dispatcher.work_root()).await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_task = self.spawn_claim_task();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight jobs to complete...");
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "Shutdown timeout elapsed with {} jobs still running",
                self.config.max_concurrent_jobs - self.job_semaphore.available_permits()
            );
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Periodically claim jobs left pending by crashed workers or retryable failures.
    fn spawn_claim_task(&self) -> JoinHandle<()> {
        let runner = Arc::clone(&self.runner);
        let semaphore = Arc::clone(&self.job_semaphore);
        let claim_interval = self.config.claim_interval;
        let min_idle_ms = self.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            let mut failures = FailureTracker::new(3);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let claimed = runner
                            .queue
                            .claim_pending(&runner.consumer_name, min_idle_ms, 5)
                            .await;
                        let jobs = match claimed {
                            Ok(jobs) => {
                                let streak = failures.record_success();
                                if streak > 0 {
                                    info!(
                                        "Claiming pending jobs recovered after {} failures",
                                        streak
                                    );
                                }
                                jobs
                            }
                            Err(e) => {
                                if failures.record_failure() {
                                    warn!("Failed to claim pending jobs: {}", e);
                                }
                                continue;
                            }
                        };

                        if !jobs.is_empty() {
                            info!("Claimed {} pending jobs", jobs.len());
                        }
                        for (message_id, job) in jobs {
                            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                                return;
                            };
                            let runner = Arc::clone(&runner);

                            tokio::spawn(async move {
                                let _permit = permit;
                                runner.execute_job(message_id, job).await;
                            });
                        }
                    }
                }
            }
        })
    }

    /// Consume and process jobs from the queue.
    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .runner
            .queue
            .consume(&self.runner.consumer_name, 1000, available.min(5))
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} jobs from queue", jobs.len());

        for (message_id, job) in jobs {
            let runner = Arc::clone(&self.runner);
            let permit = Arc::clone(&self.job_semaphore)
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("Semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                runner.execute_job(message_id, job).await;
            });
        }

        Ok(())
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        while self.job_semaphore.available_permits() < self.config.max_concurrent_jobs {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
