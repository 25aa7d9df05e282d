//! Encoding constants and configuration.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Video bitrate used by container transcodes
pub const TRANSCODE_VIDEO_BITRATE: &str = "5000k";
/// Quality scale used by container transcodes (1 = best)
pub const TRANSCODE_QSCALE: u8 = 1;

/// Codecs used when an operation re-encodes its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio codec (e.g., "aac")
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}

fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
        }
    }
}

impl EncodingConfig {
    /// Create configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            video_codec: std::env::var("ENCODE_VIDEO_CODEC")
                .unwrap_or_else(|_| default_video_codec()),
            audio_codec: std::env::var("ENCODE_AUDIO_CODEC")
                .unwrap_or_else(|_| default_audio_codec()),
        }
    }
}
