//! Object storage and job workspace staging.
//!
//! This crate provides:
//! - An S3 client for any S3-compatible endpoint
//! - The [`ObjectStore`] seam, with S3 and local directory implementations
//! - [`StagingContext`], the per-job workspace for remote jobs

pub mod client;
pub mod error;
pub mod staging;
pub mod store;

pub use client::{content_type_for, S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use staging::{stage, StagingContext};
pub use store::{key_basename, FsObjectStore, ObjectStore};
