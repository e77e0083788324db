//! Backup execution pipeline
//!
//! Runs inside the backup Pod the operator creates. One run performs:
//! parse destination -> fetch snapshot to a scratch file -> upload. Every
//! step is bounded by a single overall deadline through a shared
//! cancellation token; on failure the whole run is re-triggered externally
//! by recreating the Pod, never resumed mid-pipeline.

mod snapshot;

pub use snapshot::{HttpSnapshotSource, SnapshotSource};

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{Error, Result};
use crate::storage::{SnapshotUploader, StorageLocation};

/// Name of the staged snapshot file inside the scratch directory
const SNAPSHOT_FILE: &str = "snapshot.db";

/// Parameters of one backup run
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Directory for the staged snapshot file
    pub scratch_dir: PathBuf,
    /// URL of the data store to snapshot
    pub source_url: String,
    /// Destination URL, `scheme://bucket/objectKey`
    pub destination_url: String,
    /// Overall deadline for the whole run
    pub timeout: Duration,
}

/// Single-attempt, deadline-governed backup pipeline
pub struct BackupPipeline {
    params: PipelineParams,
    source: Box<dyn SnapshotSource>,
    uploaders: HashMap<String, Box<dyn SnapshotUploader>>,
}

impl BackupPipeline {
    pub fn new(params: PipelineParams, source: Box<dyn SnapshotSource>) -> Self {
        Self {
            params,
            source,
            uploaders: HashMap::new(),
        }
    }

    /// Register the uploader backend for a destination URL scheme.
    /// Destinations whose scheme has no registered uploader fail with
    /// `Error::UnsupportedScheme` before any snapshot is taken.
    pub fn register_uploader(&mut self, scheme: &str, uploader: Box<dyn SnapshotUploader>) {
        self.uploaders.insert(scheme.to_string(), uploader);
    }

    /// Run the pipeline to completion, returning the uploaded byte count.
    pub async fn run(&self) -> Result<u64> {
        let location = StorageLocation::parse(&self.params.destination_url)?;
        let uploader = self
            .uploaders
            .get(&location.scheme)
            .ok_or_else(|| Error::UnsupportedScheme(location.scheme.clone()))?;

        let cancel = CancellationToken::new();
        let deadline = cancel.clone();
        let timeout = self.params.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            deadline.cancel();
        });

        let scratch = self.params.scratch_dir.join(SNAPSHOT_FILE);

        info!(source = %self.params.source_url, "Fetching snapshot");
        cancel
            .run_until_cancelled(self.source.fetch(&self.params.source_url, &scratch))
            .await
            .ok_or_else(|| Error::DeadlineExceeded("snapshot fetch".to_string()))??;

        info!(destination = %location, "Uploading snapshot");
        let size = cancel
            .run_until_cancelled(uploader.upload(&location, &scratch))
            .await
            .ok_or_else(|| Error::DeadlineExceeded("upload".to_string()))??;

        info!(bytes = size, "Backup completed");
        Ok(size)
    }
}
