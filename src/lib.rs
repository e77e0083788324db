//! OSO Snapshot Backup Kubernetes Operator
//!
//! This operator manages on-demand data-store backups in Kubernetes using a
//! Custom Resource Definition. Each `SnapshotBackup` resource is driven to a
//! terminal phase by spawning a single backup Pod that snapshots the source
//! store and uploads the result to object storage.

pub mod controllers;
pub mod crd;
pub mod error;
pub mod events;
pub mod metrics;
pub mod pipeline;
pub mod reconcilers;
pub mod storage;
pub mod store;
pub mod template;

pub use error::{Error, Result};
