//! Transcode handler: re-encode into another container format.

use std::path::Path;

use vedit_models::TaskOutput;

use super::TaskContext;
use crate::error::JobResult;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Confirmation returned by a successful transcode.
pub const TRANSCODE_COMPLETE: &str = "transcode complete";

pub async fn transcode(
    ctx: &TaskContext<'_>,
    input: &Path,
    output: &Path,
    target_format: &str,
) -> JobResult<TaskOutput> {
    ctx.log.log_start(&format!(
        "transcode {} -> {} as {}",
        input.display(),
        output.display(),
        target_format
    ));

    let size = vedit_media::transcode(ctx.engine, input, output, target_format)
        .await
        .map_err(|e| ctx.log.fail(e))?;

    ctx.log.log_completion(&format!(
        "output size {:.2}MB",
        size as f64 / BYTES_PER_MB
    ));
    Ok(TaskOutput::Message(TRANSCODE_COMPLETE.to_string()))
}
