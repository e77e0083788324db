//! SnapshotBackup controller
//!
//! Watches SnapshotBackup resources (and the backup Pods they own) and
//! drives each reconciliation pass: observe, decide, apply, notify. The
//! kube runtime provides the external contracts the state machine relies
//! on: level-triggered at-least-once delivery, per-object serialization of
//! passes, and owner-reference cascade deletion of the Pod.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::ListParams,
    runtime::{
        controller::{Action as ReconcileAction, Controller},
        watcher::Config as WatcherConfig,
    },
    Api, Client, ResourceExt,
};
use tracing::{error, info, instrument};

use crate::controllers::Context;
use crate::crd::SnapshotBackup;
use crate::error::{Error, Result};
use crate::metrics;
use crate::reconcilers::{apply_action, decide, observe};
use crate::store::KubeStore;

/// Run the SnapshotBackup controller
pub async fn run(client: Client, context: Arc<Context>) {
    let api: Api<SnapshotBackup> = Api::all(client.clone());

    // Verify CRD is installed
    if let Err(e) = api.list(&ListParams::default().limit(1)).await {
        error!("SnapshotBackup CRD not installed: {}", e);
        return;
    }

    info!("Starting SnapshotBackup controller");

    Controller::new(api, WatcherConfig::default())
        .owns(Api::<Pod>::all(client.clone()), WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    info!(
                        name = %obj.name,
                        namespace = obj.namespace.as_deref().unwrap_or("default"),
                        "Reconciled SnapshotBackup"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Reconciliation error");
                    metrics::RECONCILIATION_ERRORS
                        .with_label_values(&["SnapshotBackup"])
                        .inc();
                }
            }
        })
        .await;
}

/// One reconciliation pass
#[instrument(skip(ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<SnapshotBackup>, ctx: Arc<Context>) -> Result<ReconcileAction> {
    let _timer = metrics::RECONCILE_DURATION
        .with_label_values(&["SnapshotBackup"])
        .start_timer();
    metrics::RECONCILIATIONS
        .with_label_values(&["SnapshotBackup"])
        .inc();

    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    let backups = KubeStore::new(Api::<SnapshotBackup>::namespaced(
        ctx.client.clone(),
        &namespace,
    ));
    let pods = KubeStore::new(Api::<Pod>::namespaced(ctx.client.clone(), &namespace));

    // Re-observe real state from scratch; the watch event that triggered us
    // may be arbitrarily stale.
    let state = observe(&backups, &pods, &name).await?;

    let Some(action) = decide(&state, &ctx.backup_image) else {
        return Ok(ReconcileAction::await_change());
    };

    let notification = action.notification();
    apply_action(&backups, &pods, &action).await?;

    if matches!(action, crate::reconcilers::Action::CreatePod { .. }) {
        metrics::BACKUP_PODS_CREATED
            .with_label_values(&[&namespace, &name])
            .inc();
    }

    if let (Some(notification), Some(backup)) = (notification, &state.backup) {
        ctx.notifier.notify(backup, &notification).await?;
    }

    Ok(ReconcileAction::await_change())
}

/// Error policy for the controller
fn error_policy(obj: Arc<SnapshotBackup>, error: &Error, _ctx: Arc<Context>) -> ReconcileAction {
    let name = obj.name_any();
    error!(
        name = %name,
        error = %error,
        "Reconciliation failed, scheduling retry"
    );

    let requeue_duration = match error {
        // A conflicting writer usually settles within seconds
        Error::Conflict(_) => Duration::from_secs(5),
        Error::Kube(_) | Error::Create(_) => Duration::from_secs(30),
        Error::Template(_) | Error::Validation(_) => Duration::from_secs(300),
        _ => Duration::from_secs(30),
    };

    ReconcileAction::requeue(requeue_duration)
}
