//! Media job worker binary.

use std::sync::Arc;

use tracing::{error, info};

use vedit_media::FfmpegEngine;
use vedit_queue::JobQueue;
use vedit_storage::{FsObjectStore, ObjectStore, S3Client};
use vedit_worker::{init_tracing, metrics, Dispatcher, JobExecutor, WorkerConfig};

async fn object_store() -> anyhow::Result<Arc<dyn ObjectStore>> {
    if std::env::var("S3_BUCKET").is_ok() {
        let client = S3Client::from_env().await?;
        info!("Using S3 bucket {}", client.bucket());
        Ok(Arc::new(client))
    } else {
        let store = FsObjectStore::from_env()?;
        info!("Using local object store at {}", store.root().display());
        Ok(Arc::new(store))
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS to Redis and S3)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        std::process::exit(1);
    }

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting vedit-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        if let Err(e) = metrics::init_metrics(port) {
            error!("Failed to start metrics exporter: {}", e);
            std::process::exit(1);
        }
    }

    let store = match object_store().await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to configure object storage: {}", e);
            std::process::exit(1);
        }
    };

    let mut engine = FfmpegEngine::new();
    if let Some(timeout) = config.ffmpeg_timeout {
        engine = engine.with_timeout(timeout.as_secs());
    }

    let queue = match JobQueue::from_env() {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let dispatcher = Dispatcher::new(
        Arc::new(engine),
        store,
        config.work_dir.clone(),
        config.encoding.clone(),
    );
    let executor = Arc::new(JobExecutor::new(config, queue, dispatcher));

    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_executor.shutdown();
        }
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
