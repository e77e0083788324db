//! S3-compatible snapshot uploader

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::info;

use crate::error::{Error, Result};
use crate::storage::{SnapshotUploader, StorageLocation};

/// Uploader for S3-compatible object storage (AWS S3, MinIO, Ceph, ...)
pub struct S3Uploader {
    client: Client,
}

impl S3Uploader {
    /// Build a client from ambient AWS configuration (credentials and region
    /// from the environment), optionally overriding the endpoint for
    /// S3-compatible stores. Path-style addressing is forced when an
    /// endpoint override is given, as MinIO and friends require it.
    pub async fn from_env(endpoint: Option<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let client = match endpoint {
            Some(endpoint) => {
                let s3_config = aws_sdk_s3::config::Builder::from(&config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                Client::from_conf(s3_config)
            }
            None => Client::new(&config),
        };
        Self { client }
    }
}

#[async_trait]
impl SnapshotUploader for S3Uploader {
    async fn upload(&self, location: &StorageLocation, path: &Path) -> Result<u64> {
        let size = tokio::fs::metadata(path).await?.len();
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| Error::upload(format!("reading {}: {}", path.display(), e)))?;

        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.object_key)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::upload(format!("putting {}: {}", location, e)))?;

        info!(destination = %location, bytes = size, "Snapshot uploaded");
        Ok(size)
    }
}
