//! Osbench child: a single Job running one OS micro-benchmark binary

use k8s_openapi::api::batch::v1::Job;

use benchrun_common::crd::{Osbench, OsbenchSpec};
use benchrun_common::Error;

use super::pod::{benchmark_job, container};
use super::RunMeta;
use crate::topology::Topology;

const APP: &str = "osbench";

/// Topology of an Osbench run
pub fn topology(run: &Osbench) -> Result<Topology, Error> {
    let meta = RunMeta::of(run)?;
    Ok(Topology::single_job(job(&meta, &run.spec)))
}

/// The benchmark Job: command is the test binary, args come from `options`
pub fn job(meta: &RunMeta, spec: &OsbenchSpec) -> Job {
    // Validation rejects unbalanced quotes before a Job is built.
    let args = option_args(spec).unwrap_or_else(|_| {
        spec.options
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(String::from)
            .collect()
    });
    let c = container(
        "osbench",
        &spec.image,
        &spec.pod_config,
        vec![spec.test_name.clone()],
        args,
    );
    benchmark_job(
        meta.child(meta.name.clone()),
        APP,
        &meta.name,
        &spec.image,
        &spec.pod_config,
        c,
    )
}

/// Split `options` into arguments with shell quoting rules
pub fn option_args(spec: &OsbenchSpec) -> Result<Vec<String>, String> {
    match spec.options.as_deref() {
        None => Ok(Vec::new()),
        Some(options) => shlex::split(options)
            .ok_or_else(|| format!("options {options:?} have an unterminated quote")),
    }
}
