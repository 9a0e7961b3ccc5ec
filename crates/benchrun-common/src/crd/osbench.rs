//! Osbench CRD types
//!
//! Runs one of the osbench test binaries in a single Job.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{BenchmarkStatus, ImageSpec, PodConfigurationSpec};

/// Osbench benchmark run
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "perf.benchrun.dev",
    version = "v1alpha1",
    kind = "Osbench",
    plural = "osbenches",
    namespaced,
    status = "BenchmarkStatus",
    printcolumn = r#"{"name":"Test","type":"string","jsonPath":".spec.testName"}"#,
    printcolumn = r#"{"name":"Running","type":"boolean","jsonPath":".status.running"}"#,
    printcolumn = r#"{"name":"Completed","type":"boolean","jsonPath":".status.completed"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OsbenchSpec {
    /// Image containing the osbench binaries
    pub image: ImageSpec,

    /// Pod configuration of the Job
    #[serde(default)]
    pub pod_config: PodConfigurationSpec,

    /// Options string, split into arguments with shell-like quoting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,

    /// Test binary to run, e.g. `create_files`
    pub test_name: String,
}
