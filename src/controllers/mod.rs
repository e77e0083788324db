//! Kubernetes controller for the SnapshotBackup CRD

mod backup_controller;

pub use backup_controller::run as run_backup_controller;

use std::sync::Arc;

use kube::Client;

use crate::events::{EventNotifier, Notifier};

/// Default backup Pod image, overridable via `BACKUP_IMAGE`
const DEFAULT_BACKUP_IMAGE: &str = "osodevops/snapshot-backup:latest";

/// Shared controller context
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Image used for backup Pods
    pub backup_image: String,
    /// Notification sink for reconciliation outcomes
    pub notifier: Arc<dyn Notifier>,
}

impl Context {
    /// Create a context with the event-based notifier and the image from
    /// the environment.
    pub fn new(client: Client) -> Self {
        let backup_image = std::env::var("BACKUP_IMAGE")
            .unwrap_or_else(|_| DEFAULT_BACKUP_IMAGE.to_string());
        Self {
            notifier: Arc::new(EventNotifier::new(client.clone())),
            client,
            backup_image,
        }
    }
}
