//! Benchmark runs as seen by the engine
//!
//! [`BenchmarkRun`] wraps the four CRD kinds behind one type so the engine
//! never branches on the kind itself. Per-kind behavior is pushed into the
//! builders through [`BenchmarkRun::topology`].

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;

use benchrun_common::crd::{BenchmarkStatus, Iperf3, Nighthawk, Osbench, Perfbench};
use benchrun_common::Error;

use crate::builders;
use crate::topology::Topology;

/// The four supported benchmark kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BenchmarkKind {
    /// HTTP load test with a server/client pair
    Nighthawk,
    /// Network throughput test with a server/client pair
    Iperf3,
    /// `perf bench` single job
    Perfbench,
    /// OS micro-benchmark single job
    Osbench,
}

impl std::fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nighthawk => write!(f, "Nighthawk"),
            Self::Iperf3 => write!(f, "Iperf3"),
            Self::Perfbench => write!(f, "Perfbench"),
            Self::Osbench => write!(f, "Osbench"),
        }
    }
}

/// Namespace-qualified identity of one run
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RunIdentity {
    /// Benchmark kind
    pub kind: BenchmarkKind,
    /// Namespace of the run
    pub namespace: String,
    /// Name of the run
    pub name: String,
}

impl std::fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// A benchmark run of any kind
#[derive(Clone, Debug)]
pub enum BenchmarkRun {
    /// Nighthawk run
    Nighthawk(Nighthawk),
    /// Iperf3 run
    Iperf3(Iperf3),
    /// Perfbench run
    Perfbench(Perfbench),
    /// Osbench run
    Osbench(Osbench),
}

impl BenchmarkRun {
    /// Kind of this run
    pub fn kind(&self) -> BenchmarkKind {
        match self {
            Self::Nighthawk(_) => BenchmarkKind::Nighthawk,
            Self::Iperf3(_) => BenchmarkKind::Iperf3,
            Self::Perfbench(_) => BenchmarkKind::Perfbench,
            Self::Osbench(_) => BenchmarkKind::Osbench,
        }
    }

    /// Object metadata of the wrapped resource
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Nighthawk(r) => &r.metadata,
            Self::Iperf3(r) => &r.metadata,
            Self::Perfbench(r) => &r.metadata,
            Self::Osbench(r) => &r.metadata,
        }
    }

    /// Name of the run
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Last observed resourceVersion, used as the status write precondition
    pub fn resource_version(&self) -> Option<&str> {
        self.metadata().resource_version.as_deref()
    }

    /// Identity of the run; runs are namespaced so a missing namespace is a bug
    pub fn identity(&self) -> Result<RunIdentity, Error> {
        let namespace = self.metadata().namespace.clone().ok_or_else(|| {
            Error::internal_with_context("run", format!("{} has no namespace", self.name()))
        })?;
        Ok(RunIdentity {
            kind: self.kind(),
            namespace,
            name: self.name().to_string(),
        })
    }

    /// Current status, defaulting to neither running nor completed
    pub fn status(&self) -> BenchmarkStatus {
        let status = match self {
            Self::Nighthawk(r) => r.status.as_ref(),
            Self::Iperf3(r) => r.status.as_ref(),
            Self::Perfbench(r) => r.status.as_ref(),
            Self::Osbench(r) => r.status.as_ref(),
        };
        status.cloned().unwrap_or_default()
    }

    /// Reference used as the regarding object of recorded events
    pub fn object_ref(&self) -> ObjectReference {
        match self {
            Self::Nighthawk(r) => r.object_ref(&()),
            Self::Iperf3(r) => r.object_ref(&()),
            Self::Perfbench(r) => r.object_ref(&()),
            Self::Osbench(r) => r.object_ref(&()),
        }
    }

    /// Upfront validation, run once before the run is accepted
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Nighthawk(r) => r
                .spec
                .validate()
                .map_err(|msg| Error::validation_for(self.name(), msg)),
            Self::Osbench(r) => builders::osbench::option_args(&r.spec)
                .map(|_| ())
                .map_err(|msg| Error::validation_for(self.name(), msg)),
            Self::Iperf3(_) | Self::Perfbench(_) => Ok(()),
        }
    }

    /// Desired child resources, in creation order
    pub fn topology(&self) -> Result<Topology, Error> {
        match self {
            Self::Nighthawk(r) => builders::nighthawk::topology(r),
            Self::Iperf3(r) => builders::iperf3::topology(r),
            Self::Perfbench(r) => builders::perfbench::topology(r),
            Self::Osbench(r) => builders::osbench::topology(r),
        }
    }
}

impl From<Nighthawk> for BenchmarkRun {
    fn from(run: Nighthawk) -> Self {
        Self::Nighthawk(run)
    }
}

impl From<Iperf3> for BenchmarkRun {
    fn from(run: Iperf3) -> Self {
        Self::Iperf3(run)
    }
}

impl From<Perfbench> for BenchmarkRun {
    fn from(run: Perfbench) -> Self {
        Self::Perfbench(run)
    }
}

impl From<Osbench> for BenchmarkRun {
    fn from(run: Osbench) -> Self {
        Self::Osbench(run)
    }
}
