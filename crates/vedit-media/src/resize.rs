//! Video scaling.

use std::path::Path;
use tracing::info;

use crate::command::FfmpegCommand;
use crate::engine::{encode, MediaEngine};
use crate::error::{MediaError, MediaResult};

/// Target size for a scale. `None` keeps FFmpeg's `-1` (derive from source).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleTarget {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ScaleTarget {
    /// The `scale=W:H` filter expression.
    pub fn filter(&self) -> String {
        let side = |v: Option<u32>| v.map_or_else(|| "-1".to_string(), |v| v.to_string());
        format!("scale={}:{}", side(self.width), side(self.height))
    }
}

/// Work out the output size.
///
/// With `keep_aspect_ratio` and exactly one side requested, the other side is
/// `given * original_other / original_given`, truncated.
pub fn resolve_target(
    original: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
    keep_aspect_ratio: bool,
) -> MediaResult<ScaleTarget> {
    if width.is_none() && height.is_none() {
        return Err(MediaError::invalid_parameter(
            "resize needs a width, a height, or both",
        ));
    }
    if width == Some(0) || height == Some(0) {
        return Err(MediaError::invalid_parameter("width and height must be positive"));
    }

    let (ow, oh) = (u64::from(original.0), u64::from(original.1));
    if ow == 0 || oh == 0 {
        return Err(MediaError::invalid_media(format!(
            "source reports {}x{}",
            original.0, original.1
        )));
    }

    let target = match (width, height, keep_aspect_ratio) {
        (Some(w), None, true) => ScaleTarget {
            width: Some(w),
            height: Some((u64::from(w) * oh / ow) as u32),
        },
        (None, Some(h), true) => ScaleTarget {
            width: Some((u64::from(h) * ow / oh) as u32),
            height: Some(h),
        },
        _ => ScaleTarget { width, height },
    };

    Ok(target)
}

/// Build the resize command: scale filter, audio copied.
pub fn build_resize_command(input: &Path, output: &Path, target: ScaleTarget) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .video_filter(target.filter())
        .audio_copy()
}

/// Scale the video stream of `input` into `output`.
pub async fn resize(
    engine: &dyn MediaEngine,
    input: &Path,
    output: &Path,
    width: Option<u32>,
    height: Option<u32>,
    keep_aspect_ratio: bool,
) -> MediaResult<ScaleTarget> {
    let descriptor = engine.probe(input).await?;
    let original = descriptor
        .dimensions()
        .ok_or_else(|| MediaError::NoVideoStream(input.to_path_buf()))?;

    let target = resolve_target(original, width, height, keep_aspect_ratio)?;

    info!(
        "Resizing {}: {}x{} -> {}",
        input.display(),
        original.0,
        original.1,
        target.filter()
    );

    encode(engine, &build_resize_command(input, output, target)).await?;
    Ok(target)
}
