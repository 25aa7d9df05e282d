//! Add-audio handler: lay a soundtrack under a video.

use std::path::Path;

use vedit_media::AudioMixOptions;
use vedit_models::TaskOutput;

use super::TaskContext;
use crate::error::JobResult;

pub async fn add_audio(
    ctx: &TaskContext<'_>,
    video: &Path,
    audio: &Path,
    output: &Path,
    options: &AudioMixOptions,
) -> JobResult<TaskOutput> {
    ctx.log.log_start(&format!(
        "add audio {} to {}",
        audio.display(),
        video.display()
    ));

    let plan = vedit_media::add_audio(ctx.engine, video, audio, output, options, ctx.encoding)
        .await
        .map_err(|e| ctx.log.fail(e))?;

    if options.keep_original_audio && !plan.mix_original {
        ctx.log
            .log_warning("video has no audio track to keep, using the new track only");
    }

    ctx.log.log_completion(&format!(
        "repeats={} mix_original={}",
        plan.repeats, plan.mix_original
    ));
    Ok(TaskOutput::Flag(true))
}
