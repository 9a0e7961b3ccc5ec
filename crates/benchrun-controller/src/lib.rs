//! Reconciliation engine for benchmark runs
//!
//! Drives a declared run (Nighthawk, Iperf3, Perfbench, Osbench) through its
//! fixed topology of child resources exactly once:
//! - builders derive the desired children from the run spec
//! - the engine creates them in order, gating each step on readiness
//! - ephemeral server resources are torn down once the client finishes
//! - the run's status is flipped to `completed` as the final write
//!
//! Waiting is never a sleep: an unready step returns a requeue directive
//! and the kube-rs controller runtime invokes the engine again later.

#![deny(missing_docs)]

pub mod access;
pub mod builders;
pub mod controller;
pub mod descriptor;
pub mod engine;
pub mod readiness;
pub mod run;
pub mod topology;

#[cfg(test)]
mod testing;

pub use access::{ClusterAccess, CreateOutcome, DeleteOutcome, KubeClusterAccess};
pub use controller::{error_policy, reconcile, Context, ControllerConfig};
pub use descriptor::{Descriptor, DescriptorKind};
pub use engine::{reconcile_run, Directive, EngineConfig};
pub use run::{BenchmarkKind, BenchmarkRun, RunIdentity};
pub use topology::{Readiness, Step, Topology, TopologyKind};
