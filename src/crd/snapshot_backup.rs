//! SnapshotBackup Custom Resource Definition

use std::fmt;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// SnapshotBackup resource specification
///
/// A SnapshotBackup describes a single on-demand backup of a data store:
/// where to fetch a consistent snapshot from and where to upload it. The
/// operator drives each resource forward through
/// `"" -> InProgress -> {Completed, Failed}` exactly once; terminal phases
/// are never left.
#[derive(CustomResource, Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "snapshot.oso.sh",
    version = "v1alpha1",
    kind = "SnapshotBackup",
    plural = "snapshotbackups",
    singular = "snapshotbackup",
    shortname = "sb",
    namespaced,
    status = "SnapshotBackupStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name": "Phase", "type": "string", "jsonPath": ".status.phase"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBackupSpec {
    /// URL of the data store to snapshot
    pub source_endpoint: String,

    /// Storage destination kind
    pub storage_kind: StorageKind,

    /// S3-compatible storage configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<ObjectStoreSpec>,

    /// OSS storage configuration (recognized but not yet implemented)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oss: Option<ObjectStoreSpec>,
}

/// Storage destination kind, doubling as the destination URL scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum StorageKind {
    /// S3-compatible object storage
    #[serde(rename = "s3")]
    S3,
    /// Alibaba OSS object storage
    #[serde(rename = "oss")]
    Oss,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::S3 => write!(f, "s3"),
            StorageKind::Oss => write!(f, "oss"),
        }
    }
}

/// Per-kind object storage configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStoreSpec {
    /// Storage backend endpoint (e.g. a MinIO service address)
    pub endpoint: String,

    /// Name of the Secret holding the storage credentials
    pub secret: String,

    /// Destination path template, rendered against the backup's
    /// Namespace, Name and CreationTimestamp fields.
    /// Example: `my-bucket/{{ .Namespace }}/{{ .Name }}/snapshot.db`
    pub path: String,
}

/// SnapshotBackup status
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBackupStatus {
    /// Current phase; absent until the first reconciliation pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<BackupPhase>,

    /// Human-readable message, set on terminal transitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Lifecycle phase of a SnapshotBackup
///
/// Transitions are strictly forward; Failed and Completed are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum BackupPhase {
    /// Backup Pod is being created or is running
    InProgress,
    /// Backup failed; inert
    Failed,
    /// Backup completed successfully; inert
    Completed,
}

impl fmt::Display for BackupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupPhase::InProgress => write!(f, "InProgress"),
            BackupPhase::Failed => write!(f, "Failed"),
            BackupPhase::Completed => write!(f, "Completed"),
        }
    }
}

impl SnapshotBackup {
    /// Current phase, if any
    pub fn phase(&self) -> Option<BackupPhase> {
        self.status.as_ref().and_then(|s| s.phase)
    }

    /// Copy of this resource with the given phase and message applied,
    /// used as the proposed side of a status patch.
    pub fn with_phase(&self, phase: BackupPhase, message: Option<String>) -> SnapshotBackup {
        let mut proposed = self.clone();
        proposed.status = Some(SnapshotBackupStatus {
            phase: Some(phase),
            message,
        });
        proposed
    }
}
