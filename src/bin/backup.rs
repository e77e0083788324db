//! Backup pipeline binary
//!
//! Runs inside the backup Pod the operator creates: fetches a consistent
//! snapshot from the source data store, stages it locally, and uploads it
//! to the destination named by `--destination-url`. Exits non-zero on any
//! failure so the Pod reaches a terminal Failed phase the operator can
//! observe.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use snapshot_backup_operator::pipeline::{BackupPipeline, HttpSnapshotSource, PipelineParams};
use snapshot_backup_operator::storage::S3Uploader;
use snapshot_backup_operator::Result;

#[derive(Parser, Debug)]
#[command(name = "backup", about = "Snapshot a data store and upload it to object storage")]
struct Args {
    /// Directory to stage the snapshot in (defaults to the system temp dir)
    #[arg(long)]
    backup_tmp_dir: Option<PathBuf>,

    /// URL of the data store to snapshot
    #[arg(long)]
    source_url: String,

    /// Destination URL, scheme://bucket/objectKey
    #[arg(long)]
    destination_url: String,

    /// Timeout for dialing the source store
    #[arg(long, default_value_t = 5)]
    dial_timeout_seconds: u64,

    /// Overall timeout for the backup
    #[arg(long, default_value_t = 60)]
    timeout_seconds: u64,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!(error = %e, "Backup failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<u64> {
    let params = PipelineParams {
        scratch_dir: args.backup_tmp_dir.unwrap_or_else(std::env::temp_dir),
        source_url: args.source_url,
        destination_url: args.destination_url,
        timeout: Duration::from_secs(args.timeout_seconds),
    };

    let source = HttpSnapshotSource::new(Duration::from_secs(args.dial_timeout_seconds))?;
    let mut pipeline = BackupPipeline::new(params, Box::new(source));

    // The operator injects ENDPOINT for S3-compatible stores; credentials
    // arrive through the Secret binding as AWS environment variables.
    let endpoint = std::env::var("ENDPOINT").ok().filter(|e| !e.is_empty());
    pipeline.register_uploader("s3", Box::new(S3Uploader::from_env(endpoint).await));

    let size = pipeline.run().await?;
    info!(bytes = size, "Backup completed");
    Ok(size)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
