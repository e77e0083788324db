//! Integration tests for the backup pipeline
//!
//! These tests drive the pipeline with fake snapshot sources and uploaders
//! to verify backend dispatch, deadline enforcement and failure behavior
//! without touching the network.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use snapshot_backup_operator::error::Error;
use snapshot_backup_operator::pipeline::{BackupPipeline, PipelineParams, SnapshotSource};
use snapshot_backup_operator::storage::{SnapshotUploader, StorageLocation};

// ============================================================================
// Test Helpers
// ============================================================================

/// Snapshot source writing a fixed payload after an optional delay
struct FakeSource {
    payload: Vec<u8>,
    delay: Duration,
}

impl FakeSource {
    fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            delay: Duration::ZERO,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            payload: vec![0u8; 16],
            delay,
        }
    }
}

#[async_trait]
impl SnapshotSource for FakeSource {
    async fn fetch(&self, _source_url: &str, dest: &Path) -> snapshot_backup_operator::Result<()> {
        tokio::time::sleep(self.delay).await;
        let mut file = tokio::fs::File::create(dest).await?;
        file.write_all(&self.payload).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Uploader counting its invocations and reporting the staged file size
#[derive(Default)]
struct CountingUploader {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SnapshotUploader for CountingUploader {
    async fn upload(
        &self,
        _location: &StorageLocation,
        path: &Path,
    ) -> snapshot_backup_operator::Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(tokio::fs::metadata(path).await?.len())
    }
}

fn params(scratch_dir: PathBuf, destination_url: &str, timeout: Duration) -> PipelineParams {
    PipelineParams {
        scratch_dir,
        source_url: "http://source-store:2379".to_string(),
        destination_url: destination_url.to_string(),
        timeout,
    }
}

// ============================================================================
// Pipeline Behavior
// ============================================================================

#[tokio::test]
async fn successful_run_reports_transferred_bytes() {
    let scratch = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut pipeline = BackupPipeline::new(
        params(
            scratch.path().to_path_buf(),
            "s3://bucket/ns1/backup1/snapshot.db",
            Duration::from_secs(60),
        ),
        Box::new(FakeSource::new(vec![7u8; 1024])),
    );
    pipeline.register_uploader(
        "s3",
        Box::new(CountingUploader {
            calls: calls.clone(),
        }),
    );

    let size = pipeline.run().await.unwrap();
    assert_eq!(size, 1024);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The snapshot was staged in the scratch directory.
    assert!(scratch.path().join("snapshot.db").exists());
}

#[tokio::test]
async fn unregistered_scheme_fails_before_any_work() {
    let scratch = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut pipeline = BackupPipeline::new(
        params(
            scratch.path().to_path_buf(),
            "oss://bucket/ns1/backup1/snapshot.db",
            Duration::from_secs(60),
        ),
        Box::new(FakeSource::new(vec![7u8; 64])),
    );
    pipeline.register_uploader(
        "s3",
        Box::new(CountingUploader {
            calls: calls.clone(),
        }),
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedScheme(ref s) if s.as_str() == "oss"));
    // Never a silent success with zero bytes transferred.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!scratch.path().join("snapshot.db").exists());
}

#[tokio::test]
async fn malformed_destination_is_rejected() {
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = BackupPipeline::new(
        params(
            scratch.path().to_path_buf(),
            "not-a-destination",
            Duration::from_secs(60),
        ),
        Box::new(FakeSource::new(vec![])),
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_snapshot_fetch_before_upload() {
    let scratch = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    // Snapshot latency far beyond the overall deadline.
    let mut pipeline = BackupPipeline::new(
        params(
            scratch.path().to_path_buf(),
            "s3://bucket/ns1/backup1/snapshot.db",
            Duration::from_secs(1),
        ),
        Box::new(FakeSource::slow(Duration::from_secs(600))),
    );
    pipeline.register_uploader(
        "s3",
        Box::new(CountingUploader {
            calls: calls.clone(),
        }),
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded(ref step) if step.as_str() == "snapshot fetch"));
    // The uploader was never attempted.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_a_slow_upload() {
    let scratch = tempfile::tempdir().unwrap();

    // Writes nothing so the paused clock only ever waits on timers.
    struct NoopSource;
    #[async_trait]
    impl SnapshotSource for NoopSource {
        async fn fetch(
            &self,
            _source_url: &str,
            _dest: &Path,
        ) -> snapshot_backup_operator::Result<()> {
            Ok(())
        }
    }

    struct StalledUploader;
    #[async_trait]
    impl SnapshotUploader for StalledUploader {
        async fn upload(
            &self,
            _location: &StorageLocation,
            _path: &Path,
        ) -> snapshot_backup_operator::Result<u64> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(0)
        }
    }

    let mut pipeline = BackupPipeline::new(
        params(
            scratch.path().to_path_buf(),
            "s3://bucket/ns1/backup1/snapshot.db",
            Duration::from_secs(5),
        ),
        Box::new(NoopSource),
    );
    pipeline.register_uploader("s3", Box::new(StalledUploader));

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded(ref step) if step.as_str() == "upload"));
}

#[tokio::test]
async fn snapshot_failure_aborts_the_run() {
    struct FailingSource;
    #[async_trait]
    impl SnapshotSource for FailingSource {
        async fn fetch(
            &self,
            source_url: &str,
            _dest: &Path,
        ) -> snapshot_backup_operator::Result<()> {
            Err(Error::snapshot(format!("connecting to {}: refused", source_url)))
        }
    }

    let scratch = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut pipeline = BackupPipeline::new(
        params(
            scratch.path().to_path_buf(),
            "s3://bucket/ns1/backup1/snapshot.db",
            Duration::from_secs(60),
        ),
        Box::new(FailingSource),
    );
    pipeline.register_uploader(
        "s3",
        Box::new(CountingUploader {
            calls: calls.clone(),
        }),
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::Snapshot(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
