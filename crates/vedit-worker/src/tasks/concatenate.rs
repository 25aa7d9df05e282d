//! Concatenate handler.

use std::path::{Path, PathBuf};

use vedit_models::{format_seconds, TaskOutput};

use super::TaskContext;
use crate::error::{JobError, JobResult};

/// Join `inputs` end to end. All inputs must share the same dimensions.
pub async fn concatenate(
    ctx: &TaskContext<'_>,
    inputs: &[PathBuf],
    output: &Path,
) -> JobResult<TaskOutput> {
    if inputs.is_empty() {
        return Err(ctx.log.fail(JobError::value("no input videos given")));
    }

    ctx.log.log_start(&format!(
        "concatenate {} videos into {}",
        inputs.len(),
        output.display()
    ));

    let summary = vedit_media::concatenate(ctx.engine, inputs, output, ctx.encoding)
        .await
        .map_err(|e| ctx.log.fail(e))?;

    ctx.log.log_completion(&format!(
        "{} clips, {} total, audio={}",
        summary.clips,
        format_seconds(summary.total_duration),
        summary.with_audio
    ));
    Ok(TaskOutput::Flag(true))
}
