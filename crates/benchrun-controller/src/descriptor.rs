//! Child resource descriptors
//!
//! A descriptor is a fully built child object, owner reference included.
//! Descriptors are recomputed from the run spec on every pass and never
//! mutated after construction.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Kind of a child resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Configuration files for the server
    ConfigBundle,
    /// Server Deployment
    ServerWorkload,
    /// Headless Service in front of the server
    ServerEndpoint,
    /// Client (or single) benchmark Job
    ClientWorkload,
}

impl DescriptorKind {
    /// Kubernetes kind backing this descriptor
    pub fn k8s_kind(&self) -> &'static str {
        match self {
            Self::ConfigBundle => "ConfigMap",
            Self::ServerWorkload => "Deployment",
            Self::ServerEndpoint => "Service",
            Self::ClientWorkload => "Job",
        }
    }
}

/// A desired child resource
#[derive(Clone, Debug, PartialEq)]
pub enum Descriptor {
    /// ConfigMap holding the server's configuration files
    ConfigBundle(ConfigMap),
    /// Server Deployment
    ServerWorkload(Deployment),
    /// Headless server Service
    ServerEndpoint(Service),
    /// Benchmark Job
    ClientWorkload(Job),
}

impl Descriptor {
    /// Kind of this descriptor
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Self::ConfigBundle(_) => DescriptorKind::ConfigBundle,
            Self::ServerWorkload(_) => DescriptorKind::ServerWorkload,
            Self::ServerEndpoint(_) => DescriptorKind::ServerEndpoint,
            Self::ClientWorkload(_) => DescriptorKind::ClientWorkload,
        }
    }

    /// Object metadata of the wrapped resource
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::ConfigBundle(cm) => &cm.metadata,
            Self::ServerWorkload(d) => &d.metadata,
            Self::ServerEndpoint(s) => &s.metadata,
            Self::ClientWorkload(j) => &j.metadata,
        }
    }

    /// Name of the wrapped resource
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Namespace of the wrapped resource
    pub fn namespace(&self) -> &str {
        self.metadata().namespace.as_deref().unwrap_or_default()
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.kind().k8s_kind(),
            self.namespace(),
            self.name()
        )
    }
}
