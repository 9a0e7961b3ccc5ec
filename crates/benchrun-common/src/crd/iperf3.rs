//! Iperf3 CRD types
//!
//! A network throughput test: an `iperf3 --server` Deployment behind a
//! headless Service and an `iperf3 --client` Job aimed at the Service.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{BenchmarkStatus, ImageSpec, PodConfigurationSpec};

/// Port the iperf3 server listens on
pub const IPERF3_PORT: i32 = 5201;

/// Configuration of one iperf3 role (server or client)
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Iperf3ConfigurationSpec {
    /// Pod configuration of the role
    #[serde(flatten)]
    pub pod_config: PodConfigurationSpec,

    /// Extra iperf3 arguments for the role
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmd_line_args: Vec<String>,

    /// Run the role's pod in the node's network namespace
    #[serde(default)]
    pub host_network: bool,
}

/// Iperf3 benchmark run
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "perf.benchrun.dev",
    version = "v1alpha1",
    kind = "Iperf3",
    plural = "iperf3s",
    namespaced,
    status = "BenchmarkStatus",
    printcolumn = r#"{"name":"Running","type":"boolean","jsonPath":".status.running"}"#,
    printcolumn = r#"{"name":"Completed","type":"boolean","jsonPath":".status.completed"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct Iperf3Spec {
    /// Image used by both the server and the client
    pub image: ImageSpec,

    /// Server role
    #[serde(default)]
    pub server_configuration: Iperf3ConfigurationSpec,

    /// Client role
    #[serde(default)]
    pub client_configuration: Iperf3ConfigurationSpec,

    /// Measure UDP instead of TCP
    #[serde(default)]
    pub udp: bool,
}
