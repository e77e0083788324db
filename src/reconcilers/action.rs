//! Corrective actions and their idempotent application
//!
//! A reconciliation pass produces at most one `Action`; actions are never
//! persisted and exist only within the pass that decided them.

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::debug;

use crate::crd::{BackupPhase, SnapshotBackup};
use crate::error::{Error, Result};
use crate::events::Notification;
use crate::store::ResourceStore;

/// The single corrective action decided by one pass
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Patch the request's status from `original` to `proposed`
    PatchStatus {
        original: Box<SnapshotBackup>,
        proposed: Box<SnapshotBackup>,
    },
    /// Create the backup Pod
    CreatePod { pod: Box<Pod> },
}

impl Action {
    pub fn patch_status(original: &SnapshotBackup, proposed: SnapshotBackup) -> Self {
        Action::PatchStatus {
            original: Box::new(original.clone()),
            proposed: Box::new(proposed),
        }
    }

    pub fn create_pod(pod: Pod) -> Self {
        Action::CreatePod { pod: Box::new(pod) }
    }

    /// Notification to publish once this action has been applied
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Action::CreatePod { pod } => Some(Notification::PodCreated {
                pod_name: pod.name_any(),
            }),
            Action::PatchStatus { proposed, .. } => match proposed.phase() {
                Some(BackupPhase::Failed) => Some(Notification::BackupFailed {
                    message: proposed
                        .status
                        .as_ref()
                        .and_then(|s| s.message.clone())
                        .unwrap_or_else(|| "Backup failed".to_string()),
                }),
                Some(BackupPhase::Completed) => Some(Notification::BackupSucceeded),
                _ => None,
            },
        }
    }
}

/// Apply an action against the resource store.
///
/// Status patches are skipped entirely when the proposed status equals the
/// original, guarding against redundant writes from stale-but-unchanged
/// passes. Pod creation treats already-exists as benign: a concurrent or
/// repeated pass got there first, which is exactly the state we wanted.
pub async fn apply_action(
    backups: &dyn ResourceStore<SnapshotBackup>,
    pods: &dyn ResourceStore<Pod>,
    action: &Action,
) -> Result<()> {
    match action {
        Action::PatchStatus { original, proposed } => {
            if original.status == proposed.status {
                debug!(name = %original.name_any(), "Status unchanged, skipping patch");
                return Ok(());
            }
            backups
                .patch_status(&original.name_any(), original, proposed)
                .await
        }
        Action::CreatePod { pod } => match pods.create(pod).await {
            Err(Error::AlreadyExists(name)) => {
                debug!(pod = %name, "Backup Pod already exists, ignoring");
                Ok(())
            }
            other => other,
        },
    }
}
