//! benchrun operator - drives benchmark runs to completion

mod controller_runner;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, CustomResourceExt};

use benchrun_common::crd::{Iperf3, Nighthawk, Osbench, Perfbench};
use benchrun_common::events::{EventPublisher, KubeEventPublisher, NoopEventPublisher};
use benchrun_common::FIELD_MANAGER;
use benchrun_controller::{Context, ControllerConfig};

/// benchrun - run-to-completion benchmarks on Kubernetes
#[derive(Parser, Debug)]
#[command(name = "benchrun", version, about, long_about = None)]
struct Cli {
    /// Seconds between readiness checks of a waiting run
    #[arg(long, env = "BENCHRUN_READINESS_POLL_SECS", default_value_t = 5)]
    readiness_poll_secs: u64,

    /// Seconds to wait before retrying a failed reconciliation
    #[arg(long, env = "BENCHRUN_ERROR_BACKOFF_SECS", default_value_t = 30)]
    error_backoff_secs: u64,

    /// Only watch runs in this namespace
    #[arg(long, env = "BENCHRUN_NAMESPACE")]
    namespace: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "BENCHRUN_LOG_JSON")]
    log_json: bool,

    /// Do not record Kubernetes Events
    #[arg(long, env = "BENCHRUN_NO_EVENTS")]
    no_events: bool,

    /// Install or update the CRDs on startup
    #[arg(long)]
    install_crds: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the benchmark controllers (default)
    Controller,
    /// Print the CRD manifests as YAML and exit
    Crd,
}

impl Cli {
    fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            readiness_poll: Duration::from_secs(self.readiness_poll_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
            ..Default::default()
        }
    }
}

fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![Nighthawk::crd(), Iperf3::crd(), Perfbench::crd(), Osbench::crd()]
}

fn crd_manifests() -> anyhow::Result<String> {
    let docs = all_crds()
        .iter()
        .map(|crd| {
            serde_yaml::to_string(crd)
                .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(docs.join("---\n"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.command == Some(Commands::Crd) {
        print!("{}", crd_manifests()?);
        return Ok(());
    }

    telemetry::init_logging(cli.log_json)?;
    run_controller(cli).await
}

/// Server-side apply every benchmark CRD
async fn ensure_crds_installed(client: &Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    for crd in all_crds() {
        let name = crd.metadata.name.clone().unwrap_or_default();
        tracing::info!(crd = %name, "Installing CRD");
        crds.patch(&name, &params, &Patch::Apply(&crd))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to install {} CRD: {}", name, e))?;
    }

    tracing::info!("All benchrun CRDs installed/updated");
    Ok(())
}

async fn run_controller(cli: Cli) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    if cli.install_crds {
        ensure_crds_installed(&client).await?;
    }

    let config = cli.controller_config();
    tracing::info!(
        readiness_poll = ?config.readiness_poll,
        error_backoff = ?config.error_backoff,
        "Starting benchrun controllers"
    );

    let events: Arc<dyn EventPublisher> = if cli.no_events {
        tracing::info!("Event recording disabled");
        Arc::new(NoopEventPublisher)
    } else {
        Arc::new(KubeEventPublisher::new(client.clone(), FIELD_MANAGER))
    };
    let ctx = Arc::new(Context::new(client.clone(), events, config));

    let controllers =
        controller_runner::build_benchmark_controllers(client, cli.namespace.as_deref(), ctx);
    futures::future::join_all(controllers).await;

    tracing::info!("benchrun controllers stopped");
    Ok(())
}
