//! Nighthawk children: config bundle, test server, headless Service, client Job

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, ContainerPort, PodTemplateSpec, Probe, Service, ServicePort,
    ServiceSpec, TCPSocketAction, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use benchrun_common::crd::{Nighthawk, NighthawkSpec};
use benchrun_common::Error;

use super::pod::{annotations, benchmark_job, container, pod_labels, pod_spec, selector_labels};
use super::RunMeta;
use crate::topology::{ServerGate, Topology};

const APP: &str = "nighthawk";
const CLIENT_APP: &str = "nighthawk-client";
const CONFIGS_DIR: &str = "/configs";
const CONFIGS_VOLUME: &str = "configs";

/// Topology of a Nighthawk run
pub fn topology(run: &Nighthawk) -> Result<Topology, Error> {
    let meta = RunMeta::of(run)?;
    Ok(build(&meta, &run.spec))
}

/// Build the Nighthawk topology for an already identified run
pub fn build(meta: &RunMeta, spec: &NighthawkSpec) -> Topology {
    let config = config_bundle(meta, spec);
    let server = server_deployment(meta, spec, &config);
    Topology::server_client(
        ServerGate::Endpoint,
        Some(config),
        server,
        server_service(meta, spec),
        client_job(meta, spec),
    )
}

/// Name of the server Service; also the host the client connects to
pub fn server_service_name(meta: &RunMeta) -> String {
    meta.name.clone()
}

/// Name of the client Job
pub fn client_job_name(meta: &RunMeta) -> String {
    format!("{}-client", meta.name)
}

/// `host:port` the client is pointed at
pub fn server_address(meta: &RunMeta, spec: &NighthawkSpec) -> String {
    format!(
        "{}:{}",
        server_service_name(meta),
        spec.server_configuration.port
    )
}

fn config_bundle(meta: &RunMeta, spec: &NighthawkSpec) -> ConfigMap {
    ConfigMap {
        metadata: meta.child(meta.name.clone()),
        data: Some(spec.server_configuration.configs_volume.clone()),
        ..Default::default()
    }
}

fn server_deployment(meta: &RunMeta, spec: &NighthawkSpec, config: &ConfigMap) -> Deployment {
    let server = &spec.server_configuration;
    let pod_config = &server.pod_config;

    let mut args = vec![
        "-c".to_string(),
        format!("{}/{}", CONFIGS_DIR, server.config_file),
    ];
    args.extend(server.cmd_line_args.iter().cloned());

    let mut c = container(
        "server",
        &spec.image,
        pod_config,
        vec!["nighthawk_test_server".to_string()],
        args,
    );
    c.ports = Some(vec![ContainerPort {
        name: Some("server".to_string()),
        container_port: server.port,
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }]);
    c.readiness_probe = Some(Probe {
        tcp_socket: Some(TCPSocketAction {
            port: IntOrString::Int(server.port),
            ..Default::default()
        }),
        initial_delay_seconds: Some(5),
        timeout_seconds: Some(2),
        period_seconds: Some(2),
        ..Default::default()
    });
    c.volume_mounts = Some(vec![VolumeMount {
        name: CONFIGS_VOLUME.to_string(),
        mount_path: CONFIGS_DIR.to_string(),
        ..Default::default()
    }]);

    let mut pod = pod_spec(c, &spec.image, pod_config);
    pod.volumes = Some(vec![Volume {
        name: CONFIGS_VOLUME.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: config.metadata.name.clone().unwrap_or_default(),
            ..Default::default()
        }),
        ..Default::default()
    }]);

    Deployment {
        metadata: ObjectMeta {
            annotations: annotations(pod_config),
            labels: Some(selector_labels(APP, &meta.name)),
            ..meta.child(meta.name.clone())
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector_labels(APP, &meta.name)),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels(APP, &meta.name, pod_config)),
                    annotations: annotations(pod_config),
                    ..Default::default()
                }),
                spec: Some(pod),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn server_service(meta: &RunMeta, spec: &NighthawkSpec) -> Service {
    let server = &spec.server_configuration;
    Service {
        metadata: ObjectMeta {
            annotations: annotations(&server.pod_config),
            labels: Some(selector_labels(APP, &meta.name)),
            ..meta.child(server_service_name(meta))
        },
        spec: Some(ServiceSpec {
            cluster_ip: Some("None".to_string()),
            selector: Some(selector_labels(APP, &meta.name)),
            ports: Some(vec![ServicePort {
                name: Some("nighthawk".to_string()),
                protocol: Some("TCP".to_string()),
                port: server.port,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn client_job(meta: &RunMeta, spec: &NighthawkSpec) -> Job {
    let client = &spec.client_configuration;
    let mut args = client.cmd_line_args.clone();
    args.push(server_address(meta, spec));

    let c = container(
        "nighthawk-client",
        &spec.image,
        &client.pod_config,
        vec!["nighthawk_client".to_string()],
        args,
    );
    let name = client_job_name(meta);
    benchmark_job(
        meta.child(name.clone()),
        CLIENT_APP,
        &name,
        &spec.image,
        &client.pod_config,
        c,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::builders::fixtures::run_meta;
    use crate::descriptor::{Descriptor, DescriptorKind};
    use crate::topology::{Readiness, TopologyKind};
    use benchrun_common::crd::{
        ImageSpec, NighthawkClientConfigurationSpec, NighthawkServerConfigurationSpec,
        PodConfigurationSpec,
    };
    use benchrun_common::{APP_LABEL_KEY, RUN_NAME_LABEL_KEY};

    fn spec() -> NighthawkSpec {
        NighthawkSpec {
            image: ImageSpec {
                name: "envoyproxy/nighthawk-dev:latest".to_string(),
                pull_policy: Some("Always".to_string()),
                pull_secret: Some("regcred".to_string()),
            },
            server_configuration: NighthawkServerConfigurationSpec {
                pod_config: PodConfigurationSpec {
                    annotations: BTreeMap::from([("a".to_string(), "1".to_string())]),
                    pod_labels: BTreeMap::from([("tier".to_string(), "server".to_string())]),
                    ..Default::default()
                },
                cmd_line_args: vec!["--base-id".to_string(), "1".to_string()],
                configs_volume: BTreeMap::from([(
                    "nighthawk.yaml".to_string(),
                    "static_resources: {}".to_string(),
                )]),
                config_file: "nighthawk.yaml".to_string(),
                port: 1234,
            },
            client_configuration: NighthawkClientConfigurationSpec {
                pod_config: PodConfigurationSpec {
                    annotations: BTreeMap::from([("b".to_string(), "2".to_string())]),
                    ..Default::default()
                },
                cmd_line_args: vec!["--x".to_string()],
            },
        }
    }

    struct Parts {
        config: ConfigMap,
        server: Deployment,
        service: Service,
        client: Job,
    }

    fn parts() -> Parts {
        let topology = build(&run_meta("bench-1"), &spec());
        let mut config = None;
        let mut server = None;
        let mut service = None;
        let mut client = None;
        for step in topology.steps() {
            match step.descriptor.clone() {
                Descriptor::ConfigBundle(c) => config = Some(c),
                Descriptor::ServerWorkload(d) => server = Some(d),
                Descriptor::ServerEndpoint(s) => service = Some(s),
                Descriptor::ClientWorkload(j) => client = Some(j),
            }
        }
        Parts {
            config: config.unwrap(),
            server: server.unwrap(),
            service: service.unwrap(),
            client: client.unwrap(),
        }
    }

    #[test]
    fn topology_is_endpoint_gated_with_persistent_config() {
        let topology = build(&run_meta("bench-1"), &spec());
        assert_eq!(topology.kind(), TopologyKind::ServerClientEndpointReady);
        let kinds: Vec<_> = topology.steps().iter().map(|s| s.descriptor.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                DescriptorKind::ConfigBundle,
                DescriptorKind::ServerWorkload,
                DescriptorKind::ServerEndpoint,
                DescriptorKind::ClientWorkload
            ]
        );
        assert_eq!(
            topology.steps()[2].readiness,
            Readiness::EndpointReady("bench-1".to_string())
        );
        assert_eq!(
            topology.steps()[3].readiness,
            Readiness::JobFinished("bench-1-client".to_string())
        );
    }

    #[test]
    fn client_args_end_with_server_address() {
        let client = parts().client;
        let pod = client.spec.unwrap().template.spec.unwrap();
        assert_eq!(
            pod.containers[0].args,
            Some(vec!["--x".to_string(), "bench-1:1234".to_string()])
        );
        assert_eq!(
            pod.containers[0].command,
            Some(vec!["nighthawk_client".to_string()])
        );
    }

    #[test]
    fn client_job_name_differs_from_server_address() {
        let p = parts();
        assert_eq!(p.client.metadata.name.as_deref(), Some("bench-1-client"));
        assert_eq!(p.service.metadata.name.as_deref(), Some("bench-1"));
    }

    #[test]
    fn client_job_has_fixed_retry_budget() {
        assert_eq!(parts().client.spec.unwrap().backoff_limit, Some(6));
    }

    #[test]
    fn annotations_do_not_cross_roles() {
        let p = parts();
        let server_annotations = [
            p.server.metadata.annotations.clone().unwrap(),
            p.server
                .spec
                .clone()
                .unwrap()
                .template
                .metadata
                .unwrap()
                .annotations
                .unwrap(),
            p.service.metadata.annotations.clone().unwrap(),
        ];
        for a in &server_annotations {
            assert!(a.contains_key("a"));
            assert!(!a.contains_key("b"));
        }

        let client_annotations = [
            p.client.metadata.annotations.clone().unwrap(),
            p.client
                .spec
                .clone()
                .unwrap()
                .template
                .metadata
                .unwrap()
                .annotations
                .unwrap(),
        ];
        for a in &client_annotations {
            assert!(a.contains_key("b"));
            assert!(!a.contains_key("a"));
        }

        assert!(p.config.metadata.annotations.is_none());
    }

    #[test]
    fn service_selector_matches_server_pods() {
        let p = parts();
        let selector = p.service.spec.clone().unwrap().selector.unwrap();
        let template_labels = p
            .server
            .spec
            .clone()
            .unwrap()
            .template
            .metadata
            .unwrap()
            .labels
            .unwrap();
        for (k, v) in &selector {
            assert_eq!(template_labels.get(k), Some(v));
        }
        assert_eq!(selector.get(APP_LABEL_KEY).map(String::as_str), Some("nighthawk"));
        assert_eq!(
            selector.get(RUN_NAME_LABEL_KEY).map(String::as_str),
            Some("bench-1")
        );
        assert_eq!(template_labels.get("tier").map(String::as_str), Some("server"));
        assert_eq!(
            p.server.spec.unwrap().selector.match_labels,
            Some(selector)
        );
    }

    #[test]
    fn client_pods_are_not_selected_by_server_service() {
        let p = parts();
        let selector = p.service.spec.unwrap().selector.unwrap();
        let client_labels = p.client.spec.unwrap().template.metadata.unwrap().labels.unwrap();
        assert!(!selector
            .iter()
            .all(|(k, v)| client_labels.get(k) == Some(v)));
        assert_eq!(
            client_labels.get(APP_LABEL_KEY).map(String::as_str),
            Some("nighthawk-client")
        );
        assert_eq!(
            client_labels.get(RUN_NAME_LABEL_KEY).map(String::as_str),
            Some("bench-1-client")
        );
    }

    #[test]
    fn service_is_headless_on_server_port() {
        let spec = parts().service.spec.unwrap();
        assert_eq!(spec.cluster_ip.as_deref(), Some("None"));
        let ports = spec.ports.unwrap();
        assert_eq!(ports[0].port, 1234);
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
    }

    #[test]
    fn server_mounts_config_bundle() {
        let p = parts();
        assert_eq!(p.config.metadata.name.as_deref(), Some("bench-1"));
        assert_eq!(p.config.data.as_ref().map(|d| d.len()), Some(1));

        let deployment = p.server.spec.unwrap();
        assert_eq!(deployment.replicas, Some(1));
        let pod = deployment.template.spec.unwrap();
        let server = &pod.containers[0];
        assert_eq!(server.name, "server");
        assert_eq!(
            server.command,
            Some(vec!["nighthawk_test_server".to_string()])
        );
        assert_eq!(
            server.args,
            Some(vec![
                "-c".to_string(),
                "/configs/nighthawk.yaml".to_string(),
                "--base-id".to_string(),
                "1".to_string()
            ])
        );
        assert_eq!(
            server.volume_mounts.as_ref().unwrap()[0].mount_path,
            "/configs"
        );
        let probe = server.readiness_probe.clone().unwrap();
        assert_eq!(probe.tcp_socket.unwrap().port, IntOrString::Int(1234));
        assert_eq!(probe.initial_delay_seconds, Some(5));

        let volumes = pod.volumes.unwrap();
        assert_eq!(volumes[0].config_map.as_ref().unwrap().name, "bench-1");
        assert_eq!(pod.image_pull_secrets.unwrap()[0].name, "regcred");
    }

    #[test]
    fn every_child_is_owned_by_the_run() {
        let topology = build(&run_meta("bench-1"), &spec());
        for step in topology.steps() {
            let owners = step.descriptor.metadata().owner_references.clone().unwrap();
            assert_eq!(owners[0].name, "bench-1");
            assert_eq!(step.descriptor.namespace(), "bench");
        }
    }
}
