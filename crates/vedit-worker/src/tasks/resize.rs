//! Resize handler.

use std::path::Path;

use vedit_models::TaskOutput;

use super::TaskContext;
use crate::error::JobResult;

pub async fn resize(
    ctx: &TaskContext<'_>,
    input: &Path,
    output: &Path,
    width: Option<u32>,
    height: Option<u32>,
    keep_aspect_ratio: bool,
) -> JobResult<TaskOutput> {
    ctx.log.log_start(&format!("resize {}", input.display()));

    let target = vedit_media::resize(ctx.engine, input, output, width, height, keep_aspect_ratio)
        .await
        .map_err(|e| ctx.log.fail(e))?;

    ctx.log.log_completion(&target.filter());
    Ok(TaskOutput::Flag(true))
}
