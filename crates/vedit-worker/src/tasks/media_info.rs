//! Media-info handler; read-only, never writes an output.

use std::path::Path;

use vedit_models::TaskOutput;

use super::TaskContext;
use crate::error::JobResult;

pub async fn media_info(ctx: &TaskContext<'_>, input: &Path) -> JobResult<TaskOutput> {
    ctx.log.log_start(&format!("probe {}", input.display()));

    let info = vedit_media::media_info(ctx.engine, input)
        .await
        .map_err(|e| ctx.log.fail(e))?;

    ctx.log.log_completion(&format!(
        "{} {} {}s {}",
        info.resolution, info.codec, info.duration, info.size
    ));
    Ok(TaskOutput::Info(info))
}
