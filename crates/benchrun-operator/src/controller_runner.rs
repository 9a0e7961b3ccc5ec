//! Controller runner: one kube-rs Controller per benchmark kind
//!
//! All controllers share one [`Context`], and therefore one engine; they
//! differ only in the CRD they watch.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::NamespaceResourceScope;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;

use benchrun_common::crd::{Iperf3, Nighthawk, Osbench, Perfbench};
use benchrun_controller::{error_policy, reconcile, BenchmarkRun, Context};

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
const WATCH_TIMEOUT_SECS: u32 = 25;

type ControllerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

fn api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Build the controller for one benchmark kind.
///
/// Changes to owned Jobs and Deployments re-trigger the owning run, so a
/// finishing client or a rolled-out server is noticed before the next poll.
pub fn build_controller<K>(
    client: &Client,
    namespace: Option<&str>,
    ctx: Arc<Context>,
    name: &'static str,
) -> ControllerFuture
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Into<BenchmarkRun>
        + Send
        + Sync
        + 'static,
{
    let watcher = || WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS);
    tracing::info!(namespace = namespace.unwrap_or("<all>"), "- {} controller", name);

    Box::pin(
        Controller::new(api::<K>(client, namespace), watcher())
            .owns(api::<Job>(client, namespace), watcher())
            .owns(api::<Deployment>(client, namespace), watcher())
            .shutdown_on_signal()
            .run(reconcile::<K>, error_policy::<K>, ctx)
            .for_each(log_reconcile_result(name)),
    )
}

/// Build the controllers for every benchmark kind
pub fn build_benchmark_controllers(
    client: Client,
    namespace: Option<&str>,
    ctx: Arc<Context>,
) -> Vec<ControllerFuture> {
    vec![
        build_controller::<Nighthawk>(&client, namespace, ctx.clone(), "Nighthawk"),
        build_controller::<Iperf3>(&client, namespace, ctx.clone(), "Iperf3"),
        build_controller::<Perfbench>(&client, namespace, ctx.clone(), "Perfbench"),
        build_controller::<Osbench>(&client, namespace, ctx, "Osbench"),
    ]
}

fn log_reconcile_result<T: Debug, E: Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(object) => tracing::debug!(?object, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}
