//! Pod and Job templates shared by every role

use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, LocalObjectReference, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use benchrun_common::crd::{ImageSpec, PodConfigurationSpec};
use benchrun_common::{APP_LABEL_KEY, RUN_NAME_LABEL_KEY};

/// Attempts a benchmark Job gets before it is reported as failed
pub(crate) const JOB_BACKOFF_LIMIT: i32 = 6;

/// The identifying pair used as the selector between workload and endpoint
pub(crate) fn selector_labels(app: &str, run: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_LABEL_KEY.to_string(), app.to_string()),
        (RUN_NAME_LABEL_KEY.to_string(), run.to_string()),
    ])
}

/// User pod labels with the identifying pair applied last
pub(crate) fn pod_labels(
    app: &str,
    run: &str,
    config: &PodConfigurationSpec,
) -> BTreeMap<String, String> {
    let mut labels = config.pod_labels.clone();
    labels.extend(selector_labels(app, run));
    labels
}

/// Role annotations, `None` when the role declares none
pub(crate) fn annotations(config: &PodConfigurationSpec) -> Option<BTreeMap<String, String>> {
    (!config.annotations.is_empty()).then(|| config.annotations.clone())
}

/// Container running `image` with the role's resource requirements
pub(crate) fn container(
    name: &str,
    image: &ImageSpec,
    config: &PodConfigurationSpec,
    command: Vec<String>,
    args: Vec<String>,
) -> Container {
    Container {
        name: name.to_string(),
        image: Some(image.name.clone()),
        image_pull_policy: image.pull_policy.clone(),
        command: Some(command),
        args: Some(args),
        resources: config.resources.clone(),
        ..Default::default()
    }
}

/// Pod spec for one role: the container plus scheduling and pull secret
pub(crate) fn pod_spec(
    container: Container,
    image: &ImageSpec,
    config: &PodConfigurationSpec,
) -> PodSpec {
    let scheduling = &config.pod_scheduling;
    PodSpec {
        containers: vec![container],
        image_pull_secrets: image.pull_secret.as_ref().map(|name| {
            vec![LocalObjectReference {
                name: name.clone(),
            }]
        }),
        affinity: scheduling.affinity.clone(),
        tolerations: (!scheduling.tolerations.is_empty()).then(|| scheduling.tolerations.clone()),
        node_selector: (!scheduling.node_selector.is_empty())
            .then(|| scheduling.node_selector.clone()),
        node_name: scheduling.node_name.clone(),
        ..Default::default()
    }
}

/// Benchmark Job: runs `container` once, never restarted in place
pub(crate) fn benchmark_job(
    metadata: ObjectMeta,
    app: &str,
    run: &str,
    image: &ImageSpec,
    config: &PodConfigurationSpec,
    container: Container,
) -> Job {
    let mut spec = pod_spec(container, image, config);
    spec.restart_policy = Some("Never".to_string());

    Job {
        metadata: ObjectMeta {
            labels: Some(selector_labels(app, run)),
            annotations: annotations(config),
            ..metadata
        },
        spec: Some(JobSpec {
            backoff_limit: Some(JOB_BACKOFF_LIMIT),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels(app, run, config)),
                    annotations: annotations(config),
                    ..Default::default()
                }),
                spec: Some(spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
