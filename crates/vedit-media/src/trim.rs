//! Time-range extraction.

use std::path::Path;
use tracing::{info, warn};

use vedit_models::{format_seconds, EncodingConfig};

use crate::clip::Clip;
use crate::command::FfmpegCommand;
use crate::engine::{encode, MediaEngine};
use crate::error::{MediaError, MediaResult};

/// A validated trim window in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
    /// The requested end was past the clip and has been pulled back.
    pub clamped: bool,
}

impl TrimRange {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Clamp `end` to the clip duration and check the window is non-empty.
pub fn plan_trim(start: f64, end: f64, clip_duration: f64) -> MediaResult<TrimRange> {
    let (end, clamped) = if end > clip_duration {
        (clip_duration, true)
    } else {
        (end, false)
    };

    if start >= end {
        return Err(MediaError::invalid_parameter(format!(
            "start time {} must be before end time {}",
            format_seconds(start),
            format_seconds(end)
        )));
    }

    Ok(TrimRange { start, end, clamped })
}

/// Build the trim command: input seek plus duration, re-encoded.
pub fn build_trim_command(
    input: &Path,
    output: &Path,
    range: TrimRange,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .seek(range.start)
        .duration(range.length())
        .video_codec(&encoding.video_codec)
        .audio_codec(&encoding.audio_codec)
}

/// Cut `[start, end)` out of `input` into `output`.
pub async fn trim(
    engine: &dyn MediaEngine,
    input: &Path,
    output: &Path,
    start: f64,
    end: f64,
    encoding: &EncodingConfig,
) -> MediaResult<TrimRange> {
    let clip = Clip::open(engine, input).await?;
    let clip_duration = clip.duration()?;

    let range = plan_trim(start, end, clip_duration)?;
    if range.clamped {
        warn!(
            "End time {} is past the end of {} ({}), trimming to the end of the clip",
            format_seconds(end),
            input.display(),
            format_seconds(clip_duration)
        );
    }

    info!(
        "Trimming {} from {} to {}",
        input.display(),
        format_seconds(range.start),
        format_seconds(range.end)
    );

    let cmd = build_trim_command(input, output, range, encoding);
    let result = encode(engine, &cmd).await;
    clip.close();
    result?;

    Ok(range)
}
