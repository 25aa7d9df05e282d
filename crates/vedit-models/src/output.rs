//! Task result values.

use serde::{Deserialize, Serialize};

/// Placeholder for probe fields that are absent.
pub const UNKNOWN: &str = "unknown";

/// Summary of a media file, as returned by the media-info task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Container duration in seconds
    pub duration: String,
    /// Video resolution as `WxH`
    pub resolution: String,
    /// Video codec name
    pub codec: String,
    /// Container bit rate in bits/second
    pub bit_rate: String,
    /// File size formatted as `N.NN MB`
    pub size: String,
    /// Container format name
    pub format: String,
}

/// Value returned by a successful task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutput {
    /// Confirmation message
    Message(String),
    /// Completion flag
    Flag(bool),
    /// Media summary
    Info(MediaInfo),
}
