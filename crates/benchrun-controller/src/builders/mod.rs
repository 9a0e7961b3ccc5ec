//! Resource builders
//!
//! Pure functions from a run spec to the typed child objects of its
//! topology. Given a run that passed validation they never fail; the only
//! fallible part is reading the run's own identity ([`RunMeta::of`]).

pub mod iperf3;
pub mod nighthawk;
pub mod osbench;
pub mod perfbench;
mod pod;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;

use benchrun_common::kube_utils::controller_owner_ref;
use benchrun_common::Error;

/// Identity of the owning run, stamped onto every child
#[derive(Clone, Debug, PartialEq)]
pub struct RunMeta {
    /// Run name
    pub name: String,
    /// Run namespace (children live in the same namespace)
    pub namespace: String,
    /// Controller owner reference back to the run
    pub owner: OwnerReference,
}

impl RunMeta {
    /// Read the identity of `run`; fails if it has no namespace or uid
    pub fn of<K>(run: &K) -> Result<Self, Error>
    where
        K: Resource<DynamicType = ()>,
    {
        let meta = run.meta();
        let name = meta.name.clone().unwrap_or_default();
        let namespace = meta.namespace.clone().ok_or_else(|| {
            Error::internal_with_context("builders", format!("{name} has no namespace"))
        })?;
        Ok(Self {
            owner: controller_owner_ref(run)?,
            name,
            namespace,
        })
    }

    /// Metadata for a child named `name`
    pub(crate) fn child(&self, name: impl Into<String>) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.into()),
            namespace: Some(self.namespace.clone()),
            owner_references: Some(vec![self.owner.clone()]),
            ..Default::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::RunMeta;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    pub(crate) fn run_meta(name: &str) -> RunMeta {
        RunMeta {
            name: name.to_string(),
            namespace: "bench".to_string(),
            owner: OwnerReference {
                api_version: benchrun_common::API_VERSION.to_string(),
                kind: "Test".to_string(),
                name: name.to_string(),
                uid: "uid-1".to_string(),
                controller: Some(true),
                block_owner_deletion: Some(true),
            },
        }
    }
}
