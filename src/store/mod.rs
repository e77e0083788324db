//! Generic resource store capability
//!
//! The reconciler and action executor only need three operations against the
//! control plane: get-by-name, create, and a conditional status patch with
//! optimistic concurrency. Abstracting them behind a trait keeps the core
//! logic independent of the concrete kube client and lets tests substitute
//! an in-memory store.

use async_trait::async_trait;
use kube::{
    api::{Patch, PatchParams, PostParams},
    Api, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::error::{Error, Result};

/// Field manager name used for server-side patches
pub const FIELD_MANAGER: &str = "snapshot-backup-operator";

/// Typed store over one resource kind in one namespace
#[async_trait]
pub trait ResourceStore<K>: Send + Sync {
    /// Fetch a resource by name. `Ok(None)` means the resource does not
    /// exist, which is a valid observation, not an error.
    async fn get(&self, name: &str) -> Result<Option<K>>;

    /// Create a resource. Fails with `Error::AlreadyExists` if a resource
    /// with the same name exists, `Error::Create` on any other failure.
    async fn create(&self, obj: &K) -> Result<()>;

    /// Patch the status subresource from `original` to `proposed`,
    /// conditional on `original`'s resourceVersion still being current.
    /// Fails with `Error::Conflict` if the stored object changed.
    async fn patch_status(&self, name: &str, original: &K, proposed: &K) -> Result<()>;
}

/// `ResourceStore` backed by the Kubernetes API
pub struct KubeStore<K> {
    api: Api<K>,
}

impl<K> KubeStore<K> {
    pub fn new(api: Api<K>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<K> ResourceStore<K> for KubeStore<K>
where
    K: Resource + Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, name: &str) -> Result<Option<K>> {
        Ok(self.api.get_opt(name).await?)
    }

    async fn create(&self, obj: &K) -> Result<()> {
        match self.api.create(&PostParams::default(), obj).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                Err(Error::AlreadyExists(obj.name_any()))
            }
            Err(e) => Err(Error::Create(e.to_string())),
        }
    }

    async fn patch_status(&self, name: &str, original: &K, proposed: &K) -> Result<()> {
        let proposed_value = serde_json::to_value(proposed)?;
        let status = proposed_value.get("status").cloned().unwrap_or(json!({}));

        // Carrying the original resourceVersion makes the merge conditional:
        // a concurrent writer turns this into a 409.
        let body = json!({
            "metadata": { "resourceVersion": original.resource_version() },
            "status": status,
        });

        match self
            .api
            .patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(body))
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                Err(Error::Conflict(name.to_string()))
            }
            Err(e) => Err(Error::Kube(e)),
        }
    }
}
