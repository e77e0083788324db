//! Snapshot acquisition from the source data store

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{Error, Result};

/// Acquires a consistent point-in-time snapshot into a local file
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, source_url: &str, dest: &Path) -> Result<()>;
}

/// Streams a snapshot over HTTP from the source store's snapshot endpoint
pub struct HttpSnapshotSource {
    client: reqwest::Client,
}

impl HttpSnapshotSource {
    /// `dial_timeout` bounds connection establishment only; the overall run
    /// deadline is enforced by the pipeline's cancellation token.
    pub fn new(dial_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(dial_timeout)
            .build()
            .map_err(|e| Error::snapshot(format!("building http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, source_url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| Error::snapshot(format!("connecting to {}: {}", source_url, e)))?
            .error_for_status()
            .map_err(|e| Error::snapshot(format!("snapshot request failed: {}", e)))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::snapshot(format!("streaming snapshot: {}", e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(path = %dest.display(), bytes = written, "Snapshot staged locally");
        Ok(())
    }
}
