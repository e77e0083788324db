//! Error types for the Snapshot Backup Operator

use thiserror::Error;

/// Result type alias using the operator's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Operator error types
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Optimistic concurrency conflict on a status patch
    #[error("Conflict patching resource: {0}")]
    Conflict(String),

    /// Resource already exists (benign on backup Pod creation)
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Resource creation failed
    #[error("Create error: {0}")]
    Create(String),

    /// Destination path template error
    #[error("Template error: {0}")]
    Template(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Destination URL scheme has no registered uploader
    #[error("Unsupported storage scheme: {0}")]
    UnsupportedScheme(String),

    /// Snapshot acquisition failed
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Snapshot upload failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// Deadline exceeded during a pipeline step
    #[error("Deadline exceeded during {0}")]
    DeadlineExceeded(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        Error::Template(msg.into())
    }

    /// Create a snapshot error
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Error::Snapshot(msg.into())
    }

    /// Create an upload error
    pub fn upload(msg: impl Into<String>) -> Self {
        Error::Upload(msg.into())
    }
}
