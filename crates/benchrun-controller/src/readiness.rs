//! Readiness predicates
//!
//! Pure checks over observed objects, plus [`is_ready`] which resolves a
//! step's [`Readiness`] through [`ClusterAccess`]. A missing object is
//! "not ready yet", never an error.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Endpoints;

use benchrun_common::Error;

use crate::access::ClusterAccess;
use crate::topology::Readiness;

/// Ready replicas have caught up with the desired count (default 1)
pub fn deployment_is_ready(deployment: &Deployment) -> bool {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let ready = deployment
        .status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0);
    ready >= desired
}

/// At least one subset lists a ready address
pub fn endpoints_have_addresses(endpoints: &Endpoints) -> bool {
    endpoints
        .subsets
        .as_ref()
        .map(|subsets| {
            subsets
                .iter()
                .any(|s| s.addresses.as_ref().is_some_and(|a| !a.is_empty()))
        })
        .unwrap_or(false)
}

fn has_true_condition(job: &Job, type_: &str) -> bool {
    job.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == type_ && c.status == "True")
        })
        .unwrap_or(false)
}

/// Job succeeded
pub fn job_is_complete(job: &Job) -> bool {
    has_true_condition(job, "Complete")
}

/// Job exhausted its retries
pub fn job_is_failed(job: &Job) -> bool {
    has_true_condition(job, "Failed")
}

/// Job reached a terminal state; failure counts as finished
pub fn job_is_finished(job: &Job) -> bool {
    job_is_complete(job) || job_is_failed(job)
}

/// Evaluate `readiness` for a step in `namespace`
pub async fn is_ready(
    access: &dyn ClusterAccess,
    namespace: &str,
    readiness: &Readiness,
) -> Result<bool, Error> {
    match readiness {
        Readiness::Immediate => Ok(true),
        Readiness::DeploymentReady(name) => access.deployment_ready(namespace, name).await,
        Readiness::EndpointReady(name) => access.endpoint_ready(namespace, name).await,
        Readiness::JobFinished(name) => access.job_finished(namespace, name).await,
    }
}
