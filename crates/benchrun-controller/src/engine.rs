//! Run-to-completion engine
//!
//! Every pass re-derives the next action from what is observed in the
//! cluster. Nothing is remembered between passes: an unready step yields
//! [`Directive::RetryAfter`] and the next pass repeats the idempotent
//! creates up to the same point.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use benchrun_common::crd::BenchmarkStatus;
use benchrun_common::events::{reasons, Severity};
use benchrun_common::Error;

use crate::access::{ClusterAccess, CreateOutcome, DeleteOutcome};
use crate::readiness;
use crate::run::BenchmarkRun;

/// Engine tuning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Delay before re-checking a step whose readiness is not yet satisfied
    pub readiness_poll: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            readiness_poll: Duration::from_secs(5),
        }
    }
}

/// What the dispatcher should do after a pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Nothing left to do until the run changes
    Stop,
    /// A readiness gate is still closed; invoke again after the delay
    RetryAfter(Duration),
}

/// Perform one reconciliation pass over `run`.
///
/// A completed run is absorbed without touching the cluster. A run that
/// fails validation on first observation gets a warning event and is left
/// untouched. Otherwise the topology is walked in order and the run is
/// marked completed once the final step is ready and the ephemeral steps
/// are gone.
#[instrument(
    skip(run, access, config),
    fields(
        kind = %run.kind(),
        run = %run.name(),
        namespace = run.metadata().namespace.as_deref().unwrap_or_default()
    )
)]
pub async fn reconcile_run(
    run: &BenchmarkRun,
    access: &dyn ClusterAccess,
    config: &EngineConfig,
) -> Result<Directive, Error> {
    let status = run.status();
    if status.completed {
        debug!("run already completed");
        return Ok(Directive::Stop);
    }

    if status.is_unobserved() {
        if let Err(e) = run.validate() {
            warn!(error = %e, "run failed validation, not retrying");
            access
                .record_event(run, Severity::Warning, reasons::VALIDATION_FAILED, e.to_string())
                .await;
            return Ok(Directive::Stop);
        }
    }

    let identity = run.identity()?;
    let topology = run.topology()?;

    if !status.running {
        access.update_status(run, &BenchmarkStatus::running()).await?;
        info!(topology = %topology.kind(), "run accepted");
    }

    for step in topology.steps() {
        if access.create_if_absent(&step.descriptor).await? == CreateOutcome::Created {
            info!(step = %step.descriptor, "created child");
            access
                .record_event(
                    run,
                    Severity::Normal,
                    reasons::CREATED,
                    format!("Created {}", step.descriptor),
                )
                .await;
        }
        if !readiness::is_ready(access, &identity.namespace, &step.readiness).await? {
            debug!(step = %step.descriptor, readiness = ?step.readiness, "waiting for step");
            return Ok(Directive::RetryAfter(config.readiness_poll));
        }
    }

    for step in topology.teardown_order() {
        if access.delete_if_present(&step.descriptor).await? == DeleteOutcome::Deleted {
            info!(step = %step.descriptor, "deleted ephemeral child");
            access
                .record_event(
                    run,
                    Severity::Normal,
                    reasons::DELETED,
                    format!("Deleted {}", step.descriptor),
                )
                .await;
        }
    }

    // The status write must be based on the latest copy of the run.
    let Some(current) = access.get(&identity).await? else {
        debug!("run deleted before completion");
        return Ok(Directive::Stop);
    };
    if current.status().completed {
        return Ok(Directive::Stop);
    }
    access
        .update_status(&current, &BenchmarkStatus::completed())
        .await?;
    info!("run completed");
    access
        .record_event(
            &current,
            Severity::Normal,
            reasons::COMPLETED,
            format!("{} {} completed", identity.kind, identity.name),
        )
        .await;

    Ok(Directive::Stop)
}
