//! kube-rs controller glue
//!
//! Adapts the engine to `kube::runtime::Controller`: the typed object handed
//! to [`reconcile`] is wrapped into a [`BenchmarkRun`], and [`Directive`]s
//! become controller [`Action`]s.

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use kube::{Client, Resource, ResourceExt};
use tracing::{error, info, warn};

use benchrun_common::events::EventPublisher;
use benchrun_common::kube_utils::is_conflict;
use benchrun_common::Error;

use crate::access::{ClusterAccess, KubeClusterAccess};
use crate::engine::{reconcile_run, Directive, EngineConfig};
use crate::run::BenchmarkRun;

/// Controller tuning, usually filled from the command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Requeue delay while a readiness gate is closed
    pub readiness_poll: Duration,
    /// Requeue delay after a failed pass
    pub error_backoff: Duration,
    /// Field manager recorded on created objects and status writes
    pub field_manager: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            readiness_poll: Duration::from_secs(5),
            error_backoff: Duration::from_secs(30),
            field_manager: benchrun_common::FIELD_MANAGER.to_string(),
        }
    }
}

/// Shared state for every benchmark controller
pub struct Context {
    /// Cluster access used by the engine
    pub access: Arc<dyn ClusterAccess>,
    /// Engine tuning
    pub engine: EngineConfig,
    /// Requeue delay after a failed pass
    pub error_backoff: Duration,
}

impl Context {
    /// Create a context talking to the cluster through `client`
    pub fn new(client: Client, events: Arc<dyn EventPublisher>, config: ControllerConfig) -> Self {
        Self {
            access: Arc::new(KubeClusterAccess::with_field_manager(
                client,
                events,
                config.field_manager,
            )),
            engine: EngineConfig {
                readiness_poll: config.readiness_poll,
            },
            error_backoff: config.error_backoff,
        }
    }

    /// Create a context for testing with a mock or fake cluster
    #[cfg(test)]
    pub fn for_testing(access: Arc<dyn ClusterAccess>) -> Self {
        Self {
            access,
            engine: EngineConfig::default(),
            error_backoff: Duration::from_secs(30),
        }
    }
}

impl From<Directive> for Action {
    fn from(directive: Directive) -> Self {
        match directive {
            Directive::Stop => Action::await_change(),
            Directive::RetryAfter(delay) => Action::requeue(delay),
        }
    }
}

/// Reconcile one benchmark run of any kind
pub async fn reconcile<K>(object: Arc<K>, ctx: Arc<Context>) -> Result<Action, Error>
where
    K: Clone + Into<BenchmarkRun>,
{
    let run: BenchmarkRun = (*object).clone().into();
    let directive = reconcile_run(&run, ctx.access.as_ref(), &ctx.engine).await?;
    Ok(directive.into())
}

/// Requeue after a failed pass; non-retryable errors are logged at error level.
///
/// Write conflicts are expected under concurrent edits and only logged at info.
pub fn error_policy<K>(object: Arc<K>, error: &Error, ctx: Arc<Context>) -> Action
where
    K: Resource,
{
    if let Error::Kube { source } = error {
        if is_conflict(source) {
            info!(run = %object.name_any(), "status write conflict, retrying");
            return Action::requeue(ctx.error_backoff);
        }
    }
    if error.is_retryable() {
        warn!(
            error = %error,
            run = %object.name_any(),
            "benchmark reconciliation failed, retrying"
        );
    } else {
        error!(
            ?error,
            run = %object.name_any(),
            "benchmark reconciliation failed"
        );
    }
    Action::requeue(ctx.error_backoff)
}
