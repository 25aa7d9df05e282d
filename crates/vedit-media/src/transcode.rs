//! Container transcoding.

use std::path::Path;
use tracing::info;

use vedit_models::encoding::{TRANSCODE_QSCALE, TRANSCODE_VIDEO_BITRATE};

use crate::command::FfmpegCommand;
use crate::engine::{encode, MediaEngine};
use crate::error::{MediaError, MediaResult};

/// Build the transcode command: fixed bitrate and quality, audio copied.
pub fn build_transcode_command(
    input: &Path,
    output: &Path,
    target_format: &str,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .format(target_format)
        .video_bitrate(TRANSCODE_VIDEO_BITRATE)
        .qscale(TRANSCODE_QSCALE)
        .audio_copy()
}

/// Re-encode `input` into `target_format`. Returns the output size in bytes.
pub async fn transcode(
    engine: &dyn MediaEngine,
    input: &Path,
    output: &Path,
    target_format: &str,
) -> MediaResult<u64> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    info!(
        "Transcoding {} -> {} (format: {})",
        input.display(),
        output.display(),
        target_format
    );

    let cmd = build_transcode_command(input, output, target_format);
    encode(engine, &cmd).await
}
