//! Spec model types shared by every benchmark kind

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Affinity, ResourceRequirements, Toleration};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Container image of a benchmark
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Image reference, e.g. `envoyproxy/nighthawk-dev:latest`
    pub name: String,

    /// Pull policy: `Always`, `Never` or `IfNotPresent`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,

    /// Name of the image pull Secret in the run's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret: Option<String>,
}

/// Where the pods of one role may be scheduled
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSchedulingSpec {
    /// Affinity rules for the pod
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    /// Tolerations for tainted nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,

    /// Node labels the pod must match
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    /// Pin the pod to a single node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

/// Pod-level configuration of one benchmark role
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodConfigurationSpec {
    /// Annotations applied to this role's resources only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Extra labels for this role's pods
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pod_labels: BTreeMap<String, String>,

    /// Scheduling constraints
    #[serde(default)]
    pub pod_scheduling: PodSchedulingSpec,

    /// Resource requests and limits of the benchmark container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// Status shared by every benchmark kind
///
/// `completed` implies `!running`, and once `completed` is set it is never
/// cleared.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkStatus {
    /// Child resources are being driven
    #[serde(default)]
    pub running: bool,

    /// The run reached its terminal state
    #[serde(default)]
    pub completed: bool,
}

impl BenchmarkStatus {
    /// Status written when the engine first starts driving a run
    pub fn running() -> Self {
        Self {
            running: true,
            completed: false,
        }
    }

    /// Terminal status
    pub fn completed() -> Self {
        Self {
            running: false,
            completed: true,
        }
    }

    /// Neither flag set: the engine has not accepted this run yet
    pub fn is_unobserved(&self) -> bool {
        !self.running && !self.completed
    }
}
