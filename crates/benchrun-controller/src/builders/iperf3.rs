//! Iperf3 children: server Deployment, headless Service, client Job

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ContainerPort, PodTemplateSpec, Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use benchrun_common::crd::{Iperf3, Iperf3Spec, IPERF3_PORT};
use benchrun_common::Error;

use super::pod::{annotations, benchmark_job, container, pod_labels, pod_spec, selector_labels};
use super::RunMeta;
use crate::topology::{ServerGate, Topology};

const APP: &str = "iperf3";
const CLIENT_APP: &str = "iperf3-client";

/// Topology of an Iperf3 run
pub fn topology(run: &Iperf3) -> Result<Topology, Error> {
    let meta = RunMeta::of(run)?;
    Ok(build(&meta, &run.spec))
}

/// Build the Iperf3 topology for an already identified run
pub fn build(meta: &RunMeta, spec: &Iperf3Spec) -> Topology {
    Topology::server_client(
        ServerGate::Deployment,
        None,
        server_deployment(meta, spec),
        server_service(meta, spec),
        client_job(meta, spec),
    )
}

fn protocols(spec: &Iperf3Spec) -> Vec<&'static str> {
    if spec.udp {
        vec!["TCP", "UDP"]
    } else {
        vec!["TCP"]
    }
}

fn server_deployment(meta: &RunMeta, spec: &Iperf3Spec) -> Deployment {
    let server = &spec.server_configuration;
    let pod_config = &server.pod_config;

    let mut args = vec![
        "--server".to_string(),
        "--port".to_string(),
        IPERF3_PORT.to_string(),
    ];
    args.extend(server.cmd_line_args.iter().cloned());

    let mut c = container(
        "server",
        &spec.image,
        pod_config,
        vec!["iperf3".to_string()],
        args,
    );
    c.ports = Some(
        protocols(spec)
            .into_iter()
            .map(|protocol| ContainerPort {
                name: Some(format!("server-{}", protocol.to_lowercase())),
                container_port: IPERF3_PORT,
                protocol: Some(protocol.to_string()),
                ..Default::default()
            })
            .collect(),
    );

    let mut pod = pod_spec(c, &spec.image, pod_config);
    pod.host_network = server.host_network.then_some(true);

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

fn server_service(meta: &RunMeta, spec: &Iperf3Spec) -> Service {
    Service {
        metadata: ObjectMeta {
            annotations: annotations(&spec.server_configuration.pod_config),
            labels: Some(selector_labels(APP, &meta.name)),
            ..meta.child(meta.name.clone())
        },
        spec: Some(ServiceSpec {
            cluster_ip: Some("None".to_string()),
            selector: Some(selector_labels(APP, &meta.name)),
            ports: Some(
                protocols(spec)
                    .into_iter()
                    .map(|protocol| ServicePort {
                        name: Some(format!("iperf3-{}", protocol.to_lowercase())),
                        protocol: Some(protocol.to_string()),
                        port: IPERF3_PORT,
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn client_job(meta: &RunMeta, spec: &Iperf3Spec) -> Job {
    let client = &spec.client_configuration;

    let mut args = client.cmd_line_args.clone();
    if spec.udp {
        args.push("--udp".to_string());
    }
    args.extend([
        "--client".to_string(),
        meta.name.clone(),
        "--port".to_string(),
        IPERF3_PORT.to_string(),
    ]);

    let c = container(
        "client",
        &spec.image,
        &client.pod_config,
        vec!["iperf3".to_string()],
        args,
    );
    let name = format!("{}-client", meta.name);
    let mut job = benchmark_job(
        meta.child(name.clone()),
        CLIENT_APP,
        &name,
        &spec.image,
        &client.pod_config,
        c,
    );
    if client.host_network {
        if let Some(pod) = job.spec.as_mut().and_then(|s| s.template.spec.as_mut()) {
            pod.host_network = Some(true);
        }
    }
    job
}
