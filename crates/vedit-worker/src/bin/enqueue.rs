//! Submit a job to the worker queue.
//!
//! Usage: `vedit-enqueue <job.json> [--keep-local]`
//!
//! The file holds a job request, e.g.
//!
//! ```json
//! {"task": "trim", "input": {"remote": "in/a.mp4"}, "output": {"remote": "out/a.mp4"},
//!  "start_time": "0:05", "end_time": "0:10"}
//! ```

use anyhow::Context;
use tracing::info;

use vedit_models::JobRequest;
use vedit_queue::{JobQueue, QueueJob};
use vedit_worker::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let mut path = None;
    let mut keep_local = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--keep-local" => keep_local = true,
            _ if path.is_none() => path = Some(arg),
            other => anyhow::bail!("unexpected argument {}", other),
        }
    }
    let path = path.context("usage: vedit-enqueue <job.json> [--keep-local]")?;

    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path))?;
    let request: JobRequest = serde_json::from_str(&contents)
        .with_context(|| format!("invalid job request in {}", path))?;
    request.validate()?;

    let job = QueueJob::new(request).with_keep_local(keep_local);
    let queue = JobQueue::from_env()?;
    queue.init().await?;
    let message_id = queue.enqueue(&job).await?;

    info!(job_id = %job.job_id(), "Enqueued {} job as {}", job.kind(), message_id);
    println!("{}", job.job_id());
    Ok(())
}
