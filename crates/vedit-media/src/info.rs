//! Media summaries for the media-info task.

use std::path::Path;
use tracing::info;

use vedit_models::{MediaInfo, UNKNOWN};

use crate::engine::MediaEngine;
use crate::error::MediaResult;
use crate::probe::MediaDescriptor;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string())
}

/// Render a probe result as labelled strings. Absent fields read `unknown`.
pub fn summarize(descriptor: &MediaDescriptor) -> MediaInfo {
    let size_bytes = descriptor.size.unwrap_or(0);

    MediaInfo {
        duration: or_unknown(descriptor.duration.map(|d| format!("{:.6}", d))),
        resolution: format!(
            "{}x{}",
            or_unknown(descriptor.width),
            or_unknown(descriptor.height)
        ),
        codec: or_unknown(descriptor.codec.as_deref()),
        bit_rate: or_unknown(descriptor.bit_rate),
        size: format!("{:.2} MB", size_bytes as f64 / BYTES_PER_MB),
        format: or_unknown(descriptor.format_name.as_deref()),
    }
}

/// Probe `path` and summarize it.
pub async fn media_info(engine: &dyn MediaEngine, path: &Path) -> MediaResult<MediaInfo> {
    let descriptor = engine.probe(path).await?;
    let summary = summarize(&descriptor);
    info!(
        "Probed {}: {} {} {}s",
        path.display(),
        summary.resolution,
        summary.codec,
        summary.duration
    );
    Ok(summary)
}
