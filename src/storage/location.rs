//! Storage destination URL codec
//!
//! Destinations are URL-shaped strings of the form
//! `scheme://bucket/objectKey...`, e.g. `s3://my-bucket/my-dir/my-object.db`.
//! The scheme selects the uploader backend, the first path segment is the
//! bucket (or container), and the remainder is the object key with the
//! leading separator stripped.

use std::fmt;

use crate::error::{Error, Result};

/// Parsed snapshot destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub scheme: String,
    pub bucket: String,
    pub object_key: String,
}

impl StorageLocation {
    /// Parse a destination URL into its components.
    pub fn parse(url: &str) -> Result<StorageLocation> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| Error::validation(format!("destination URL '{}' has no scheme", url)))?;

        if scheme.is_empty() {
            return Err(Error::validation(format!("destination URL '{}' has no scheme", url)));
        }

        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, key.trim_start_matches('/')),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return Err(Error::validation(format!("destination URL '{}' has no bucket", url)));
        }
        if key.is_empty() {
            return Err(Error::validation(format!(
                "destination URL '{}' has no object key",
                url
            )));
        }

        Ok(StorageLocation {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            object_key: key.to_string(),
        })
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.object_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_bucket_and_key() {
        let loc = StorageLocation::parse("s3://bucket/dir/obj.db").unwrap();
        assert_eq!(loc.scheme, "s3");
        assert_eq!(loc.bucket, "bucket");
        assert_eq!(loc.object_key, "dir/obj.db");
    }

    #[test]
    fn round_trips_through_display() {
        let url = "s3://my-bucket/ns1/backup1/snapshot.db";
        assert_eq!(StorageLocation::parse(url).unwrap().to_string(), url);
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(StorageLocation::parse("bucket/dir/obj.db").is_err());
        assert!(StorageLocation::parse("://bucket/obj.db").is_err());
    }

    #[test]
    fn rejects_missing_bucket_or_key() {
        assert!(StorageLocation::parse("s3:///dir/obj.db").is_err());
        assert!(StorageLocation::parse("s3://bucket").is_err());
        assert!(StorageLocation::parse("s3://bucket/").is_err());
    }
}
