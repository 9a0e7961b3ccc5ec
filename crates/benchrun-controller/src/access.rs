//! Cluster access used by the engine
//!
//! [`ClusterAccess`] is the whole surface the engine needs from Kubernetes.
//! The trait exists so the engine can be driven by mocks and an in-memory
//! fake in tests; [`KubeClusterAccess`] is the production implementation.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Endpoints, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use benchrun_common::crd::{BenchmarkStatus, Iperf3, Nighthawk, Osbench, Perfbench};
use benchrun_common::events::{actions, reasons, EventPublisher, Severity};
use benchrun_common::kube_utils::{is_already_exists, is_not_found};
use benchrun_common::Error;

use crate::descriptor::Descriptor;
use crate::readiness::{deployment_is_ready, endpoints_have_addresses, job_is_finished};
use crate::run::{BenchmarkKind, BenchmarkRun, RunIdentity};

/// Result of an idempotent create
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The object was created by this call
    Created,
    /// An object with the same name already existed
    AlreadyExists,
}

/// Result of an idempotent delete
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deletion was accepted by this call
    Deleted,
    /// There was nothing to delete
    Gone,
}

/// Operations the engine performs against the cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterAccess: Send + Sync {
    /// Read the current state of a run; `None` if it no longer exists
    async fn get(&self, identity: &RunIdentity) -> Result<Option<BenchmarkRun>, Error>;

    /// Create a child unless one with the same name exists
    async fn create_if_absent(&self, descriptor: &Descriptor) -> Result<CreateOutcome, Error>;

    /// Delete a child if it is still present
    async fn delete_if_present(&self, descriptor: &Descriptor) -> Result<DeleteOutcome, Error>;

    /// Write `status` to the run, conditional on the run's resourceVersion
    async fn update_status(
        &self,
        run: &BenchmarkRun,
        status: &BenchmarkStatus,
    ) -> Result<(), Error>;

    /// Record an Event on the run. Never fails.
    async fn record_event(
        &self,
        run: &BenchmarkRun,
        severity: Severity,
        reason: &str,
        message: String,
    );

    /// Deployment has all desired replicas ready
    async fn deployment_ready(&self, namespace: &str, name: &str) -> Result<bool, Error>;

    /// Service endpoints list at least one ready address
    async fn endpoint_ready(&self, namespace: &str, name: &str) -> Result<bool, Error>;

    /// Job succeeded or failed
    async fn job_finished(&self, namespace: &str, name: &str) -> Result<bool, Error>;
}

/// [`ClusterAccess`] backed by the Kubernetes API
pub struct KubeClusterAccess {
    client: Client,
    events: Arc<dyn EventPublisher>,
    field_manager: String,
}

impl KubeClusterAccess {
    /// Create an access layer writing as `field_manager`
    pub fn with_field_manager(
        client: Client,
        events: Arc<dyn EventPublisher>,
        field_manager: impl Into<String>,
    ) -> Self {
        Self {
            client,
            events,
            field_manager: field_manager.into(),
        }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get_run<K>(&self, identity: &RunIdentity) -> Result<Option<BenchmarkRun>, Error>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned
            + Into<BenchmarkRun>,
    {
        let run = self
            .api::<K>(&identity.namespace)
            .get_opt(&identity.name)
            .await?;
        Ok(run.map(Into::into))
    }

    async fn create<K>(&self, object: &K) -> Result<CreateOutcome, Error>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + Serialize
            + DeserializeOwned,
    {
        let namespace = object.meta().namespace.as_deref().unwrap_or_default();
        let params = PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };
        match self.api::<K>(namespace).create(&params, object).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if is_already_exists(&e) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete<K>(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, Error>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned,
    {
        match self
            .api::<K>(namespace)
            .delete(name, &DeleteParams::background())
            .await
        {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(e) if is_not_found(&e) => Ok(DeleteOutcome::Gone),
            Err(e) => Err(e.into()),
        }
    }

    async fn patch_status<K>(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<(), Error>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned,
    {
        let params = PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };
        self.api::<K>(namespace)
            .patch_status(name, &params, &Patch::Merge(patch))
            .await?;
        Ok(())
    }

    async fn read<K>(&self, namespace: &str, name: &str) -> Result<Option<K>, Error>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned,
    {
        Ok(self.api::<K>(namespace).get_opt(name).await?)
    }
}

/// Merge patch writing `status`, rejected with 409 if the run changed since
/// `resource_version` was read
pub fn status_patch(
    resource_version: Option<&str>,
    status: &BenchmarkStatus,
) -> Result<serde_json::Value, Error> {
    let status = serde_json::to_value(status)
        .map_err(|e| Error::serialization_for_kind("BenchmarkStatus", e.to_string()))?;
    let mut patch = serde_json::json!({ "status": status });
    if let Some(rv) = resource_version {
        patch["metadata"] = serde_json::json!({ "resourceVersion": rv });
    }
    Ok(patch)
}

fn action_for(reason: &str) -> &'static str {
    match reason {
        reasons::VALIDATION_FAILED => actions::VALIDATE,
        reasons::CREATED => actions::CREATE,
        reasons::DELETED => actions::DELETE,
        _ => actions::COMPLETE,
    }
}

#[async_trait]
impl ClusterAccess for KubeClusterAccess {
    async fn get(&self, identity: &RunIdentity) -> Result<Option<BenchmarkRun>, Error> {
        match identity.kind {
            BenchmarkKind::Nighthawk => self.get_run::<Nighthawk>(identity).await,
            BenchmarkKind::Iperf3 => self.get_run::<Iperf3>(identity).await,
            BenchmarkKind::Perfbench => self.get_run::<Perfbench>(identity).await,
            BenchmarkKind::Osbench => self.get_run::<Osbench>(identity).await,
        }
    }

    async fn create_if_absent(&self, descriptor: &Descriptor) -> Result<CreateOutcome, Error> {
        let outcome = match descriptor {
            Descriptor::ConfigBundle(cm) => self.create(cm).await?,
            Descriptor::ServerWorkload(d) => self.create(d).await?,
            Descriptor::ServerEndpoint(s) => self.create(s).await?,
            Descriptor::ClientWorkload(j) => self.create(j).await?,
        };
        debug!(resource = %descriptor, ?outcome, "create");
        Ok(outcome)
    }

    async fn delete_if_present(&self, descriptor: &Descriptor) -> Result<DeleteOutcome, Error> {
        let (namespace, name) = (descriptor.namespace(), descriptor.name());
        let outcome = match descriptor {
            Descriptor::ConfigBundle(_) => self.delete::<ConfigMap>(namespace, name).await?,
            Descriptor::ServerWorkload(_) => self.delete::<Deployment>(namespace, name).await?,
            Descriptor::ServerEndpoint(_) => self.delete::<Service>(namespace, name).await?,
            Descriptor::ClientWorkload(_) => self.delete::<Job>(namespace, name).await?,
        };
        debug!(resource = %descriptor, ?outcome, "delete");
        Ok(outcome)
    }

    async fn update_status(
        &self,
        run: &BenchmarkRun,
        status: &BenchmarkStatus,
    ) -> Result<(), Error> {
        let identity = run.identity()?;
        let patch = status_patch(run.resource_version(), status)?;
        let (namespace, name) = (identity.namespace.as_str(), identity.name.as_str());
        match identity.kind {
            BenchmarkKind::Nighthawk => {
                self.patch_status::<Nighthawk>(namespace, name, &patch)
                    .await
            }
            BenchmarkKind::Iperf3 => self.patch_status::<Iperf3>(namespace, name, &patch).await,
            BenchmarkKind::Perfbench => {
                self.patch_status::<Perfbench>(namespace, name, &patch)
                    .await
            }
            BenchmarkKind::Osbench => self.patch_status::<Osbench>(namespace, name, &patch).await,
        }
    }

    async fn record_event(
        &self,
        run: &BenchmarkRun,
        severity: Severity,
        reason: &str,
        message: String,
    ) {
        self.events
            .publish(
                &run.object_ref(),
                severity,
                reason,
                action_for(reason),
                Some(message),
            )
            .await;
    }

    async fn deployment_ready(&self, namespace: &str, name: &str) -> Result<bool, Error> {
        let deployment = self.read::<Deployment>(namespace, name).await?;
        Ok(deployment.as_ref().is_some_and(deployment_is_ready))
    }

    async fn endpoint_ready(&self, namespace: &str, name: &str) -> Result<bool, Error> {
        let endpoints = self.read::<Endpoints>(namespace, name).await?;
        Ok(endpoints.as_ref().is_some_and(endpoints_have_addresses))
    }

    async fn job_finished(&self, namespace: &str, name: &str) -> Result<bool, Error> {
        let job = self.read::<Job>(namespace, name).await?;
        Ok(job.as_ref().is_some_and(job_is_finished))
    }
}
