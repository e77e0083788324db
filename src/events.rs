//! Notification capability
//!
//! Reconciliation outcomes are surfaced as Kubernetes Events on the
//! SnapshotBackup resource. The notifier is injected through the controller
//! context so tests can substitute a recording variant.

use async_trait::async_trait;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};

use crate::crd::SnapshotBackup;
use crate::error::Result;

/// Event reason for backup Pod creation
pub const REASON_POD_CREATED: &str = "SuccessfulCreate";
/// Event reason for a failed backup
pub const REASON_BACKUP_FAILED: &str = "BackupFailed";
/// Event reason for a completed backup
pub const REASON_BACKUP_SUCCEEDED: &str = "BackupSucceeded";

/// A notification produced by one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    PodCreated { pod_name: String },
    BackupFailed { message: String },
    BackupSucceeded,
}

/// Publishes notifications about a SnapshotBackup
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, backup: &SnapshotBackup, notification: &Notification) -> Result<()>;
}

/// Notifier backed by the Kubernetes Events API
pub struct EventNotifier {
    client: Client,
    reporter: Reporter,
}

impl EventNotifier {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            reporter: Reporter {
                controller: "snapshot-backup-operator".to_string(),
                instance: std::env::var("HOSTNAME").ok(),
            },
        }
    }
}

#[async_trait]
impl Notifier for EventNotifier {
    async fn notify(&self, backup: &SnapshotBackup, notification: &Notification) -> Result<()> {
        let recorder = Recorder::new(
            self.client.clone(),
            self.reporter.clone(),
            backup.object_ref(&()),
        );

        let event = match notification {
            Notification::PodCreated { pod_name } => Event {
                type_: EventType::Normal,
                reason: REASON_POD_CREATED.to_string(),
                note: Some(format!("Created backup Pod: {}", pod_name)),
                action: "Creating".to_string(),
                secondary: None,
            },
            Notification::BackupFailed { message } => Event {
                type_: EventType::Warning,
                reason: REASON_BACKUP_FAILED.to_string(),
                note: Some(message.clone()),
                action: "Reconciling".to_string(),
                secondary: None,
            },
            Notification::BackupSucceeded => Event {
                type_: EventType::Normal,
                reason: REASON_BACKUP_SUCCEEDED.to_string(),
                note: Some("Backup completed successfully".to_string()),
                action: "Reconciling".to_string(),
                secondary: None,
            },
        };

        recorder.publish(event).await?;
        Ok(())
    }
}
