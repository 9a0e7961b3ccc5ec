//! Nighthawk CRD types
//!
//! An HTTP load test: a `nighthawk_test_server` Deployment behind a headless
//! Service, fed by a ConfigMap of server configuration files, and a
//! `nighthawk_client` Job aimed at the Service.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{BenchmarkStatus, ImageSpec, PodConfigurationSpec};

/// Client role of a Nighthawk run
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NighthawkClientConfigurationSpec {
    /// Pod configuration of the client Job
    #[serde(flatten)]
    pub pod_config: PodConfigurationSpec,

    /// Arguments passed to `nighthawk_client` before the server address
    #[serde(default)]
    pub cmd_line_args: Vec<String>,
}

/// Server role of a Nighthawk run
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NighthawkServerConfigurationSpec {
    /// Pod configuration of the server Deployment
    #[serde(flatten)]
    pub pod_config: PodConfigurationSpec,

    /// Arguments passed to `nighthawk_test_server` after the config file flag
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmd_line_args: Vec<String>,

    /// Files mounted under `/configs`, keyed by file name
    #[serde(default)]
    pub configs_volume: BTreeMap<String, String>,

    /// Entry file; must be one of the keys of `configs_volume`
    pub config_file: String,

    /// Port the test server listens on
    pub port: i32,
}

/// Nighthawk benchmark run
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "perf.benchrun.dev",
    version = "v1alpha1",
    kind = "Nighthawk",
    plural = "nighthawks",
    namespaced,
    status = "BenchmarkStatus",
    printcolumn = r#"{"name":"Running","type":"boolean","jsonPath":".status.running"}"#,
    printcolumn = r#"{"name":"Completed","type":"boolean","jsonPath":".status.completed"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NighthawkSpec {
    /// Image used by both the server and the client
    pub image: ImageSpec,

    /// Server role
    #[serde(default)]
    pub server_configuration: NighthawkServerConfigurationSpec,

    /// Client role
    #[serde(default)]
    pub client_configuration: NighthawkClientConfigurationSpec,
}

impl NighthawkSpec {
    /// Check that the entry file is part of the config bundle.
    pub fn validate(&self) -> Result<(), String> {
        let server = &self.server_configuration;
        if !server.configs_volume.contains_key(&server.config_file) {
            return Err(format!(
                "configFile '{}' does not exist in configsVolume",
                server.config_file
            ));
        }
        Ok(())
    }
}
