//! Job handlers, one per task kind.
//!
//! Handlers work on local paths only; staging remote objects is the
//! dispatcher's business. Each handler logs its failure through the job
//! logger and propagates exactly one [`JobError`](crate::error::JobError).

mod add_audio;
mod concatenate;
mod media_info;
mod resize;
mod transcode;
mod trim;

pub use add_audio::add_audio;
pub use concatenate::concatenate;
pub use media_info::media_info;
pub use resize::resize;
pub use transcode::transcode;
pub use trim::trim;

use vedit_media::MediaEngine;
use vedit_models::EncodingConfig;

use crate::logging::JobLogger;

/// Collaborators injected into every handler.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    pub engine: &'a dyn MediaEngine,
    pub encoding: &'a EncodingConfig,
    pub log: &'a JobLogger,
}
