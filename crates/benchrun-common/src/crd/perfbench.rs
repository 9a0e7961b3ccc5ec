//! Perfbench CRD types
//!
//! Runs `perf bench` in a single privileged Job.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{BenchmarkStatus, ImageSpec, PodConfigurationSpec};

/// Perfbench benchmark run
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "perf.benchrun.dev",
    version = "v1alpha1",
    kind = "Perfbench",
    plural = "perfbenches",
    namespaced,
    status = "BenchmarkStatus",
    printcolumn = r#"{"name":"Running","type":"boolean","jsonPath":".status.running"}"#,
    printcolumn = r#"{"name":"Completed","type":"boolean","jsonPath":".status.completed"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PerfbenchSpec {
    /// Image containing the `perf` binary
    pub image: ImageSpec,

    /// Arguments passed to `perf bench`, e.g. `["sched", "pipe"]`
    #[serde(default)]
    pub cmd_line_args: Vec<String>,

    /// Pod configuration of the Job
    #[serde(default)]
    pub pod_config: PodConfigurationSpec,
}
