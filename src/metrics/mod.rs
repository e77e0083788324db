//! Prometheus metrics for the Snapshot Backup Operator
//!
//! This module exposes metrics for monitoring operator health and performance.

mod prometheus;

pub use prometheus::*;
