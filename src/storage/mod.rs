//! Storage destinations for uploaded snapshots

mod location;
mod s3;

pub use location::StorageLocation;
pub use s3::S3Uploader;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Uploads a staged snapshot file to one kind of storage backend
#[async_trait]
pub trait SnapshotUploader: Send + Sync {
    /// Upload the file at `path` to `location`, returning the number of
    /// bytes transferred.
    async fn upload(&self, location: &StorageLocation, path: &Path) -> Result<u64>;
}
