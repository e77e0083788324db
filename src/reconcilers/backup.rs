//! SnapshotBackup reconciler
//!
//! The heart of the operator: a level-triggered state machine that compares
//! the declared backup request against observed reality (the backup Pod and
//! its terminal outcome) and decides at most one corrective action per pass.
//! Every pass re-observes from scratch, so a crash between observation and
//! action is safe; the stored phase acts as the only cross-pass lock token.

use k8s_openapi::api::core::v1::{
    Container, EnvFromSource, EnvVar, Pod, PodSpec, ResourceRequirements, SecretEnvSource,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};
use tracing::info;

use crate::crd::{BackupPhase, ObjectStoreSpec, SnapshotBackup, StorageKind};
use crate::error::{Error, Result};
use crate::reconcilers::action::Action;
use crate::storage::StorageLocation;
use crate::store::ResourceStore;
use crate::template::{self, PathContext};

/// Container name inside the backup Pod
const BACKUP_CONTAINER: &str = "snapshot-backup";

/// Fixed CPU request and limit for the backup Pod
const BACKUP_CPU: &str = "100m";
/// Fixed memory request and limit for the backup Pod
const BACKUP_MEMORY: &str = "100Mi";

/// Observed state of one backup request
#[derive(Debug, Clone, Default)]
pub struct BackupState {
    /// The request itself; `None` means it was deleted
    pub backup: Option<SnapshotBackup>,
    /// The backup Pod; `None` means it has not been created yet
    pub pod: Option<Pod>,
}

/// Fetch the current state of a backup request and its Pod.
///
/// Not-found is a valid observation for both lookups; any other store
/// failure aborts the pass so the scheduler retries it.
pub async fn observe(
    backups: &dyn ResourceStore<SnapshotBackup>,
    pods: &dyn ResourceStore<Pod>,
    name: &str,
) -> Result<BackupState> {
    let backup = backups.get(name).await?;
    let pod = match &backup {
        Some(_) => pods.get(name).await?,
        None => None,
    };
    Ok(BackupState { backup, pod })
}

/// Decide the single next corrective action for the observed state.
///
/// Transition rules, first match wins:
/// 1. request deleted -> none
/// 2. deletion requested -> none (owner references cascade the Pod)
/// 3. no phase -> patch phase to InProgress (the creation lock)
/// 4. Failed -> none (terminal)
/// 5. Completed -> none (terminal)
/// 6. Pod absent -> create the desired Pod; an invalid spec instead
///    patches phase to Failed, since it can never succeed on retry
/// 7. Pod failed -> patch phase to Failed
/// 8. Pod succeeded -> patch phase to Completed
/// 9. Pod still running -> none, wait for the next observation
///
/// Each eligible rule is satisfied by at most one real-world state, so
/// re-running with unchanged inputs always yields the same action and
/// applying it makes the pass fall through to a later, inert rule.
pub fn decide(state: &BackupState, backup_image: &str) -> Option<Action> {
    let Some(backup) = &state.backup else {
        info!("Backup object not found, nothing to do");
        return None;
    };
    let name = backup.name_any();

    if backup.meta().deletion_timestamp.is_some() {
        info!(name = %name, "Backup object is being deleted, nothing to do");
        return None;
    }

    match backup.phase() {
        None => {
            info!(name = %name, "Backup starting");
            return Some(Action::patch_status(
                backup,
                backup.with_phase(BackupPhase::InProgress, Some("Backup is starting".into())),
            ));
        }
        Some(BackupPhase::Failed) => {
            info!(name = %name, "Backup has failed, ignoring");
            return None;
        }
        Some(BackupPhase::Completed) => {
            info!(name = %name, "Backup has completed, ignoring");
            return None;
        }
        Some(BackupPhase::InProgress) => {}
    }

    let Some(pod) = &state.pod else {
        return match build_backup_pod(backup, backup_image) {
            Ok(pod) => {
                info!(name = %name, "Backup Pod does not exist, creating");
                Some(Action::create_pod(pod))
            }
            Err(e) => {
                info!(name = %name, error = %e, "Backup spec is invalid, failing terminally");
                Some(Action::patch_status(
                    backup,
                    backup.with_phase(BackupPhase::Failed, Some(e.to_string())),
                ))
            }
        };
    };

    match pod_phase(pod) {
        Some("Failed") => {
            info!(name = %name, "Backup Pod failed");
            Some(Action::patch_status(
                backup,
                backup.with_phase(
                    BackupPhase::Failed,
                    Some("Backup failed. See backup Pod for detail information.".into()),
                ),
            ))
        }
        Some("Succeeded") => {
            info!(name = %name, "Backup Pod succeeded");
            Some(Action::patch_status(
                backup,
                backup.with_phase(
                    BackupPhase::Completed,
                    Some("Backup completed successfully".into()),
                ),
            ))
        }
        _ => {
            info!(name = %name, "Backup Pod still running, waiting");
            None
        }
    }
}

fn pod_phase(pod: &Pod) -> Option<&str> {
    pod.status.as_ref()?.phase.as_deref()
}

/// Build the desired backup Pod for a request.
///
/// Renders the destination path template, validates the selected storage
/// kind's configuration and emits a single-container Pod with fixed
/// resources, no restarts and an owner reference back to the request.
pub fn build_backup_pod(backup: &SnapshotBackup, image: &str) -> Result<Pod> {
    let (store, kind) = storage_config(backup)?;
    let destination_url = render_destination(backup, store, kind)?;

    let resources: std::collections::BTreeMap<String, Quantity> = [
        ("cpu".to_string(), Quantity(BACKUP_CPU.to_string())),
        ("memory".to_string(), Quantity(BACKUP_MEMORY.to_string())),
    ]
    .into();

    Ok(Pod {
        metadata: ObjectMeta {
            name: Some(backup.name_any()),
            namespace: backup.namespace(),
            owner_references: backup.controller_owner_ref(&()).map(|oref| vec![oref]),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: BACKUP_CONTAINER.to_string(),
                image: Some(image.to_string()),
                args: Some(vec![
                    "--source-url".to_string(),
                    backup.spec.source_endpoint.clone(),
                    "--destination-url".to_string(),
                    destination_url,
                ]),
                env: Some(vec![EnvVar {
                    name: "ENDPOINT".to_string(),
                    value: Some(store.endpoint.clone()),
                    ..Default::default()
                }]),
                env_from: Some(vec![EnvFromSource {
                    secret_ref: Some(SecretEnvSource {
                        name: store.secret.clone(),
                        optional: None,
                    }),
                    ..Default::default()
                }]),
                resources: Some(ResourceRequirements {
                    requests: Some(resources.clone()),
                    limits: Some(resources),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Select the sub-config for the requested storage kind.
///
/// The oss kind is recognized but has no uploader backend yet; it must fail
/// explicitly here rather than produce an empty destination.
fn storage_config(backup: &SnapshotBackup) -> Result<(&ObjectStoreSpec, StorageKind)> {
    match backup.spec.storage_kind {
        StorageKind::S3 => {
            let store = backup.spec.s3.as_ref().ok_or_else(|| {
                Error::validation("s3 storage selected but s3 configuration is missing")
            })?;
            if store.secret.is_empty() {
                return Err(Error::validation("s3 configuration has no credentials secret"));
            }
            Ok((store, StorageKind::S3))
        }
        StorageKind::Oss => Err(Error::validation(
            "oss storage is recognized but not implemented",
        )),
    }
}

fn render_destination(
    backup: &SnapshotBackup,
    store: &ObjectStoreSpec,
    kind: StorageKind,
) -> Result<String> {
    let ctx = PathContext {
        namespace: backup.namespace().unwrap_or_default(),
        name: backup.name_any(),
        creation_timestamp: backup
            .meta()
            .creation_timestamp
            .as_ref()
            .map(|t| t.0.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            .unwrap_or_default(),
    };

    let rendered = template::render(&store.path, &ctx)?;
    let url = format!("{}://{}", kind, rendered);

    // Catch templates that render to something unusable before the Pod runs.
    StorageLocation::parse(&url)?;
    Ok(url)
}
