//! Redis Streams job queue.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams with deduplication
//! - Consumer-group consumption, ack and retry counters
//! - Dead-letter stream and claiming of orphaned jobs

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::QueueJob;
pub use queue::{JobQueue, QueueConfig};
