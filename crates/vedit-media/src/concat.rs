//! Ordered concatenation of compatible videos.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use vedit_models::{format_seconds, EncodingConfig};

use crate::clip::Clip;
use crate::command::FfmpegCommand;
use crate::compat::check_compatibility;
use crate::engine::{encode, MediaEngine};
use crate::error::{MediaError, MediaResult};

/// Summary of a finished concatenation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatSummary {
    pub clips: usize,
    pub total_duration: f64,
    pub with_audio: bool,
}

/// Audio carried by one concatenation segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentAudio {
    /// The input's own first audio stream.
    Stream,
    /// Generated silence of this many seconds.
    Silence(f64),
}

impl SegmentAudio {
    fn of(clip: &Clip) -> MediaResult<Self> {
        if clip.has_audio() {
            Ok(SegmentAudio::Stream)
        } else {
            clip.duration().map(SegmentAudio::Silence)
        }
    }
}

/// Sample rate and layout of the silence filling audio-less segments.
const SILENCE_SOURCE: &str = "anullsrc=r=48000:cl=stereo";

/// The concat filter graph over `segments`, in input order.
///
/// With at least one [`SegmentAudio::Stream`] the output has an audio track
/// and silent segments are padded; otherwise it is video only.
pub fn build_concat_filter(segments: &[SegmentAudio]) -> String {
    let with_audio = segments.iter().any(|s| *s == SegmentAudio::Stream);
    let mut filter = String::new();

    if with_audio {
        for (i, segment) in segments.iter().enumerate() {
            if let SegmentAudio::Silence(duration) = segment {
                filter.push_str(&format!(
                    "{},atrim=duration={:.3}[s{}];",
                    SILENCE_SOURCE, duration, i
                ));
            }
        }
    }

    for (i, segment) in segments.iter().enumerate() {
        filter.push_str(&format!("[{}:v:0]", i));
        if with_audio {
            match segment {
                SegmentAudio::Stream => filter.push_str(&format!("[{}:a:0]", i)),
                SegmentAudio::Silence(_) => filter.push_str(&format!("[s{}]", i)),
            }
        }
    }

    let count = segments.len();
    if with_audio {
        filter.push_str(&format!("concat=n={}:v=1:a=1[v][a]", count));
    } else {
        filter.push_str(&format!("concat=n={}:v=1:a=0[v]", count));
    }
    filter
}

/// Build the concatenation command over `inputs` (non-empty), one
/// [`SegmentAudio`] per input.
pub fn build_concat_command(
    inputs: &[PathBuf],
    segments: &[SegmentAudio],
    output: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<FfmpegCommand> {
    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| MediaError::EmptyInput("no videos to concatenate".to_string()))?;
    if segments.len() != inputs.len() {
        return Err(MediaError::internal(format!(
            "{} audio segments for {} inputs",
            segments.len(),
            inputs.len()
        )));
    }

    let mut cmd = FfmpegCommand::new(first, output);
    for input in rest {
        cmd = cmd.add_input(input);
    }

    cmd = cmd
        .filter_complex(build_concat_filter(segments))
        .map("[v]")
        .video_codec(&encoding.video_codec);

    cmd = if segments.contains(&SegmentAudio::Stream) {
        cmd.map("[a]").audio_codec(&encoding.audio_codec)
    } else {
        cmd.no_audio()
    };

    Ok(cmd)
}

/// Join `inputs` end to end into `output`.
///
/// Dimensions are checked before any clip is loaded for the join. When any
/// input has audio the output keeps it, with silence under the inputs that
/// have none.
pub async fn concatenate(
    engine: &dyn MediaEngine,
    inputs: &[PathBuf],
    output: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<ConcatSummary> {
    let (width, height) = check_compatibility(engine, inputs).await?;

    let mut clips = Vec::with_capacity(inputs.len());
    for path in inputs {
        let clip = Clip::open(engine, path).await?;
        debug!(
            "Loaded {} ({})",
            path.display(),
            format_seconds(clip.duration()?)
        );
        clips.push(clip);
    }

    let segments = clips
        .iter()
        .map(SegmentAudio::of)
        .collect::<MediaResult<Vec<_>>>()?;
    let with_audio = segments.contains(&SegmentAudio::Stream);
    let total_duration = clips
        .iter()
        .map(Clip::duration)
        .sum::<MediaResult<f64>>()?;

    info!(
        "Concatenating {} clips at {}x{}, total {}{}",
        clips.len(),
        width,
        height,
        format_seconds(total_duration),
        if with_audio { "" } else { " (no audio)" }
    );

    let cmd = build_concat_command(inputs, &segments, output, encoding)?;
    let result = encode(engine, &cmd).await;

    for clip in clips {
        clip.close();
    }
    result?;

    Ok(ConcatSummary {
        clips: inputs.len(),
        total_duration,
        with_audio,
    })
}
