//! Audio track replacement and mixing.

use std::path::Path;
use tracing::info;

use vedit_models::{format_seconds, EncodingConfig};

use crate::clip::Clip;
use crate::command::FfmpegCommand;
use crate::engine::{encode, MediaEngine};
use crate::error::{MediaError, MediaResult};

/// How the new track is combined with the video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioMixOptions {
    /// Gain applied to the new track
    pub volume: f64,
    /// Repeat the new track when it is shorter than the video
    pub loop_audio: bool,
    /// Mix with the video's own audio instead of replacing it
    pub keep_original_audio: bool,
    /// Gain applied to the video's own audio when mixing
    pub original_audio_volume: f64,
}

impl Default for AudioMixOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            loop_audio: false,
            keep_original_audio: false,
            original_audio_volume: 0.0,
        }
    }
}

/// Resolved timing and mixing decisions for one add-audio job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioPlan {
    pub video_duration: f64,
    pub audio_duration: f64,
    /// Times the new track is played back to back (1 = no looping)
    pub repeats: u32,
    /// Whether the video's own audio is mixed in
    pub mix_original: bool,
    pub volume: f64,
    pub original_audio_volume: f64,
}

impl AudioPlan {
    /// Extra plays requested from FFmpeg's `-stream_loop`.
    pub fn extra_loops(&self) -> u32 {
        self.repeats.saturating_sub(1)
    }
}

pub fn plan_audio(
    video_duration: f64,
    audio_duration: f64,
    video_has_audio: bool,
    options: &AudioMixOptions,
) -> MediaResult<AudioPlan> {
    if !(options.volume.is_finite() && options.volume >= 0.0) {
        return Err(MediaError::invalid_parameter(format!(
            "volume must be a non-negative number, got {}",
            options.volume
        )));
    }
    if !(options.original_audio_volume.is_finite() && options.original_audio_volume >= 0.0) {
        return Err(MediaError::invalid_parameter(format!(
            "original audio volume must be a non-negative number, got {}",
            options.original_audio_volume
        )));
    }

    let repeats = if options.loop_audio && audio_duration < video_duration {
        (video_duration / audio_duration).floor() as u32 + 1
    } else {
        1
    };

    Ok(AudioPlan {
        video_duration,
        audio_duration,
        repeats,
        mix_original: options.keep_original_audio && video_has_audio,
        volume: options.volume,
        original_audio_volume: options.original_audio_volume,
    })
}

/// Filter graph producing `[aout]`.
///
/// The new track is padded with silence and cut to exactly the video length
/// before any mixing.
pub fn build_audio_filter(plan: &AudioPlan) -> String {
    let new_track = format!(
        "[1:a:0]apad,atrim=end={:.3},asetpts=PTS-STARTPTS,volume={}",
        plan.video_duration, plan.volume
    );

    if plan.mix_original {
        format!(
            "{new_track}[new];[0:a:0]volume={orig}[orig];\
             [orig][new]amix=inputs=2:duration=longest:dropout_transition=0:normalize=0[aout]",
            new_track = new_track,
            orig = plan.original_audio_volume
        )
    } else {
        format!("{}[aout]", new_track)
    }
}

pub fn build_add_audio_command(
    video: &Path,
    audio: &Path,
    output: &Path,
    plan: &AudioPlan,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(video, output).add_input(audio);
    if plan.extra_loops() > 0 {
        cmd = cmd.stream_loop(plan.extra_loops());
    }

    cmd.filter_complex(build_audio_filter(plan))
        .map("0:v:0")
        .map("[aout]")
        .video_codec(&encoding.video_codec)
        .audio_codec(&encoding.audio_codec)
}

/// Put `audio` under `video`, writing the result to `output`.
pub async fn add_audio(
    engine: &dyn MediaEngine,
    video: &Path,
    audio: &Path,
    output: &Path,
    options: &AudioMixOptions,
    encoding: &EncodingConfig,
) -> MediaResult<AudioPlan> {
    let video_clip = Clip::open(engine, video).await?;
    let audio_clip = Clip::open(engine, audio).await?;

    if !audio_clip.has_audio() {
        return Err(MediaError::invalid_media(format!(
            "{} has no audio stream",
            audio.display()
        )));
    }

    let plan = plan_audio(
        video_clip.duration()?,
        audio_clip.duration()?,
        video_clip.has_audio(),
        options,
    )?;

    info!(
        "Adding audio {} ({}) to {} ({}), repeats={}, mix_original={}",
        audio.display(),
        format_seconds(plan.audio_duration),
        video.display(),
        format_seconds(plan.video_duration),
        plan.repeats,
        plan.mix_original
    );

    let cmd = build_add_audio_command(video, audio, output, &plan, encoding);
    let result = encode(engine, &cmd).await;

    audio_clip.close();
    video_clip.close();
    result?;

    Ok(plan)
}
