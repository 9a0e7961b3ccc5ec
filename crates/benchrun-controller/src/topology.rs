//! Topologies: the fixed, ordered child-resource steps of a benchmark kind
//!
//! A step pairs a descriptor with the readiness predicate that must hold
//! before the next step is attempted. Ephemeral steps are torn down, in
//! reverse creation order, once the final step is ready.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Service};

use crate::descriptor::Descriptor;

/// Condition that gates progression past a step
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// Ready as soon as the resource exists
    Immediate,
    /// The named Deployment has all desired replicas ready
    DeploymentReady(String),
    /// The named Service's Endpoints list at least one address
    EndpointReady(String),
    /// The named Job succeeded or failed
    JobFinished(String),
}

/// Which server readiness gates the client in a server/client topology
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerGate {
    /// Gate on the server Deployment's rollout
    Deployment,
    /// Gate on the server Service having endpoints
    Endpoint,
}

/// Shape of a topology
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopologyKind {
    /// [Client Workload]
    SingleJob,
    /// [Server Workload, Server Endpoint, Client Workload], gated on rollout
    ServerClientDeploymentReady,
    /// [Config Bundle, Server Workload, Server Endpoint, Client Workload], gated on endpoints
    ServerClientEndpointReady,
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleJob => write!(f, "single-job"),
            Self::ServerClientDeploymentReady => write!(f, "server-client/deployment"),
            Self::ServerClientEndpointReady => write!(f, "server-client/endpoint"),
        }
    }
}

/// One step of a topology
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Resource created by this step
    pub descriptor: Descriptor,
    /// Condition to satisfy before moving on
    pub readiness: Readiness,
    /// Delete this resource once the final step is ready
    pub ephemeral: bool,
}

/// Ordered steps of one run
#[derive(Clone, Debug, PartialEq)]
pub struct Topology {
    kind: TopologyKind,
    steps: Vec<Step>,
}

impl Topology {
    /// A single benchmark Job, finished when the Job terminates
    pub fn single_job(job: Job) -> Self {
        let name = job_name(&job);
        Self {
            kind: TopologyKind::SingleJob,
            steps: vec![Step {
                descriptor: Descriptor::ClientWorkload(job),
                readiness: Readiness::JobFinished(name),
                ephemeral: false,
            }],
        }
    }

    /// A server Deployment and Service followed by a client Job.
    ///
    /// The gate is evaluated on the Service step, so both server resources
    /// exist before the engine starts waiting. A config bundle, when given,
    /// is created first and outlives the run's teardown.
    pub fn server_client(
        gate: ServerGate,
        config: Option<ConfigMap>,
        server: Deployment,
        endpoint: Service,
        client: Job,
    ) -> Self {
        let gate_readiness = match gate {
            ServerGate::Deployment => {
                Readiness::DeploymentReady(server.metadata.name.clone().unwrap_or_default())
            }
            ServerGate::Endpoint => {
                Readiness::EndpointReady(endpoint.metadata.name.clone().unwrap_or_default())
            }
        };
        let kind = match gate {
            ServerGate::Deployment => TopologyKind::ServerClientDeploymentReady,
            ServerGate::Endpoint => TopologyKind::ServerClientEndpointReady,
        };
        let client_name = job_name(&client);

        let mut steps = Vec::with_capacity(4);
        if let Some(cm) = config {
            steps.push(Step {
                descriptor: Descriptor::ConfigBundle(cm),
                readiness: Readiness::Immediate,
                ephemeral: false,
            });
        }
        steps.push(Step {
            descriptor: Descriptor::ServerWorkload(server),
            readiness: Readiness::Immediate,
            ephemeral: true,
        });
        steps.push(Step {
            descriptor: Descriptor::ServerEndpoint(endpoint),
            readiness: gate_readiness,
            ephemeral: true,
        });
        steps.push(Step {
            descriptor: Descriptor::ClientWorkload(client),
            readiness: Readiness::JobFinished(client_name),
            ephemeral: false,
        });

        Self { kind, steps }
    }

    /// Shape of this topology
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// Steps in creation order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Ephemeral steps in teardown order (reverse of creation)
    pub fn teardown_order(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().rev().filter(|s| s.ephemeral)
    }
}

fn job_name(job: &Job) -> String {
    job.metadata.name.clone().unwrap_or_default()
}
