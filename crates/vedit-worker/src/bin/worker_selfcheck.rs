use std::path::Path;

use vedit_media::{check_ffmpeg, check_ffprobe};
use vedit_storage::S3Client;
use vedit_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "worker-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;

    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!(
        "worker-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );

    ensure_env_present(&["REDIS_URL"])?;
    ensure_any_env_present(&["S3_BUCKET", "LOCAL_STORE_DIR"])?;

    if std::env::var("S3_BUCKET").is_ok() {
        let client = S3Client::from_env().await?;
        client.check_connectivity().await?;
        println!("worker-selfcheck: bucket {} reachable", client.bucket());
    }

    println!("worker-selfcheck: ok");
    Ok(())
}

/// The work dir must exist and accept new files.
async fn ensure_workdir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;

    let marker = path.join(".selfcheck");
    tokio::fs::write(&marker, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("work dir {} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&marker).await?;
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}

fn ensure_any_env_present(vars: &[&str]) -> anyhow::Result<()> {
    if vars.iter().any(|var| std::env::var(var).is_ok()) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("one of {} must be set", vars.join(", ")))
    }
}
