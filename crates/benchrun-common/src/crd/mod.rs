//! Custom Resource Definitions for benchmark runs
//!
//! Every benchmark kind is a namespaced CRD in `perf.benchrun.dev/v1alpha1`
//! sharing [`BenchmarkStatus`] as its status subresource.

mod iperf3;
mod nighthawk;
mod osbench;
mod perfbench;
mod types;

pub use iperf3::{Iperf3, Iperf3ConfigurationSpec, Iperf3Spec, IPERF3_PORT};
pub use nighthawk::{
    Nighthawk, NighthawkClientConfigurationSpec, NighthawkServerConfigurationSpec, NighthawkSpec,
};
pub use osbench::{Osbench, OsbenchSpec};
pub use perfbench::{Perfbench, PerfbenchSpec};
pub use types::{BenchmarkStatus, ImageSpec, PodConfigurationSpec, PodSchedulingSpec};
