//! Media job worker.
//!
//! This crate provides:
//! - Job handlers for each media task
//! - The dispatcher that stages remote files and routes jobs by task name
//! - The job executor over the Redis Streams queue
//! - Structured job logging, metrics and graceful shutdown

pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod retry;
pub mod tasks;

pub use config::WorkerConfig;
pub use dispatch::Dispatcher;
pub use error::{JobError, JobResult, WorkerError, WorkerResult};
pub use executor::{FailureAction, JobExecutor};
pub use logging::{init_tracing, JobLogger};
