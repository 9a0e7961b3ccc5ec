//! Kubernetes Event recording for benchmark runs.
//!
//! Events are **fire-and-forget**: a publish failure is logged as a warning
//! and never returned. Recording an event must never change the outcome of a
//! reconciliation pass.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

#[cfg(test)]
use mockall::automock;

/// Severity of a recorded event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Expected progress (resource created, run completed)
    Normal,
    /// Something a user should look at (validation failure)
    Warning,
}

impl From<Severity> for EventType {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Normal => EventType::Normal,
            Severity::Warning => EventType::Warning,
        }
    }
}

/// Trait for publishing Kubernetes Events.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an Event about `resource_ref`.
    ///
    /// * `reason` - machine-readable reason (see [`reasons`])
    /// * `action` - what the controller was doing (see [`actions`])
    /// * `note` - optional human-readable message
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        severity: Severity,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Production implementation wrapping `kube::runtime::events::Recorder`.
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// Create a new publisher reporting as `controller_name`.
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        severity: Severity,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = kube::runtime::events::Event {
            type_: severity.into(),
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource_ref).await {
            warn!(
                reason,
                action,
                error = %e,
                "Failed to publish Kubernetes event"
            );
        }
    }
}

/// Publisher that drops every event. Used when event recording is disabled.
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(
        &self,
        _resource_ref: &ObjectReference,
        _severity: Severity,
        _reason: &str,
        _action: &str,
        _note: Option<String>,
    ) {
    }
}

/// Well-known event reason strings.
pub mod reasons {
    /// Run spec failed upfront validation; the run will not be retried
    pub const VALIDATION_FAILED: &str = "ValidationFailed";
    /// A child resource was created
    pub const CREATED: &str = "Created";
    /// An ephemeral child resource was torn down
    pub const DELETED: &str = "Deleted";
    /// The run reached its terminal state
    pub const COMPLETED: &str = "Completed";
}

/// Well-known event action strings.
pub mod actions {
    /// Upfront spec validation
    pub const VALIDATE: &str = "Validate";
    /// Creating a child resource
    pub const CREATE: &str = "Create";
    /// Deleting a child resource
    pub const DELETE: &str = "Delete";
    /// Writing the run's terminal status
    pub const COMPLETE: &str = "Complete";
}
