//! Reconciliation logic for the Snapshot Backup Operator
//!
//! `backup` holds the pure decision state machine and desired-state
//! construction; `action` holds the corrective actions a pass can emit and
//! their idempotent application against the resource store.

pub mod action;
pub mod backup;

pub use action::{apply_action, Action};
pub use backup::{build_backup_pod, decide, observe, BackupState};
