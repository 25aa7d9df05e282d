//! Trim handler.

use std::path::Path;

use vedit_models::{format_seconds, parse_time, TaskOutput};

use super::TaskContext;
use crate::error::JobResult;

/// Trim `input` to `[start_time, end_time)`.
///
/// Times accept `HH:MM:SS`, `MM:SS` or plain seconds. An end past the clip is
/// pulled back to the clip's duration; the warning is logged before encoding.
pub async fn trim(
    ctx: &TaskContext<'_>,
    input: &Path,
    output: &Path,
    start_time: &str,
    end_time: &str,
) -> JobResult<TaskOutput> {
    ctx.log.log_start(&format!(
        "trim {} from {} to {}",
        input.display(),
        start_time,
        end_time
    ));

    let start = parse_time(start_time).map_err(|e| ctx.log.fail(e))?;
    let end = parse_time(end_time).map_err(|e| ctx.log.fail(e))?;

    let range = vedit_media::trim(ctx.engine, input, output, start, end, ctx.encoding)
        .await
        .map_err(|e| ctx.log.fail(e))?;

    ctx.log.log_completion(&format!(
        "kept {}{}",
        format_seconds(range.length()),
        if range.clamped { " (end clamped to clip)" } else { "" }
    ));
    Ok(TaskOutput::Flag(true))
}
