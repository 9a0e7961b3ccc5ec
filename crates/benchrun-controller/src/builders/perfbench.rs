//! Perfbench child: a single privileged `perf bench` Job

use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::SecurityContext;

use benchrun_common::crd::{Perfbench, PerfbenchSpec};
use benchrun_common::Error;

use super::pod::{benchmark_job, container};
use super::RunMeta;
use crate::topology::Topology;

const APP: &str = "perfbench";

/// Topology of a Perfbench run
pub fn topology(run: &Perfbench) -> Result<Topology, Error> {
    let meta = RunMeta::of(run)?;
    Ok(Topology::single_job(job(&meta, &run.spec)))
}

/// The benchmark Job; `perf` needs a privileged container to read counters
pub fn job(meta: &RunMeta, spec: &PerfbenchSpec) -> Job {
    let mut c = container(
        "perfbench",
        &spec.image,
        &spec.pod_config,
        vec!["perf".to_string(), "bench".to_string()],
        spec.cmd_line_args.clone(),
    );
    c.security_context = Some(SecurityContext {
        privileged: Some(true),
        ..Default::default()
    });
    benchmark_job(
        meta.child(meta.name.clone()),
        APP,
        &meta.name,
        &spec.image,
        &spec.pod_config,
        c,
    )
}
