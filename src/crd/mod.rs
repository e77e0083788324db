//! Custom Resource Definitions for the Snapshot Backup Operator

mod snapshot_backup;

pub use snapshot_backup::*;

use kube::CustomResourceExt;

/// Generate all CRD YAML manifests
pub fn generate_crds() -> Vec<String> {
    vec![serde_yaml::to_string(&SnapshotBackup::crd()).unwrap()]
}
