//! In-memory cluster for multi-pass engine tests

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use benchrun_common::crd::BenchmarkStatus;
use benchrun_common::events::Severity;
use benchrun_common::Error;

use crate::access::{ClusterAccess, CreateOutcome, DeleteOutcome};
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::run::{BenchmarkRun, RunIdentity};

/// One observed cluster call
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Get,
    Create(DescriptorKind, String),
    Delete(DescriptorKind, String),
    UpdateStatus(BenchmarkStatus),
    Event(Severity, String),
    DeploymentReady(String),
    EndpointReady(String),
    JobFinished(String),
}

#[derive(Default)]
struct State {
    run: Option<BenchmarkRun>,
    objects: HashSet<(DescriptorKind, String)>,
    ready: HashSet<String>,
    failed: HashSet<String>,
    calls: Vec<Call>,
    conflicts: usize,
}

/// Fake cluster holding one run and its children
pub(crate) struct FakeCluster {
    state: Mutex<State>,
}

fn conflict() -> Error {
    Error::from(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: "the object has been modified".to_string(),
        reason: "Conflict".to_string(),
        code: 409,
    }))
}

fn metadata_mut(run: &mut BenchmarkRun) -> &mut ObjectMeta {
    match run {
        BenchmarkRun::Nighthawk(r) => &mut r.metadata,
        BenchmarkRun::Iperf3(r) => &mut r.metadata,
        BenchmarkRun::Perfbench(r) => &mut r.metadata,
        BenchmarkRun::Osbench(r) => &mut r.metadata,
    }
}

fn set_status(run: &mut BenchmarkRun, status: BenchmarkStatus) {
    match run {
        BenchmarkRun::Nighthawk(r) => r.status = Some(status),
        BenchmarkRun::Iperf3(r) => r.status = Some(status),
        BenchmarkRun::Perfbench(r) => r.status = Some(status),
        BenchmarkRun::Osbench(r) => r.status = Some(status),
    }
}

fn bump_resource_version(run: &mut BenchmarkRun) {
    let meta = metadata_mut(run);
    let next = meta
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    meta.resource_version = Some(next.to_string());
}

impl FakeCluster {
    pub(crate) fn new(run: impl Into<BenchmarkRun>) -> Self {
        let mut run = run.into();
        let meta = metadata_mut(&mut run);
        meta.namespace.get_or_insert_with(|| "bench".to_string());
        meta.uid.get_or_insert_with(|| "uid-1".to_string());
        meta.resource_version = Some("1".to_string());
        Self {
            state: Mutex::new(State {
                run: Some(run),
                ..Default::default()
            }),
        }
    }

    /// Current stored copy of the run
    pub(crate) fn run(&self) -> Option<BenchmarkRun> {
        self.state.lock().unwrap().run.clone()
    }

    pub(crate) fn status(&self) -> BenchmarkStatus {
        self.run().map(|r| r.status()).unwrap_or_default()
    }

    /// Mark the named Deployment, Endpoints or Job as ready
    pub(crate) fn make_ready(&self, name: &str) {
        self.state.lock().unwrap().ready.insert(name.to_string());
    }

    /// Mark the named Job as failed after exhausting its retries
    pub(crate) fn make_failed(&self, name: &str) {
        self.state.lock().unwrap().failed.insert(name.to_string());
    }

    /// Simulate an external edit racing the next `n` status writes
    pub(crate) fn conflict_next_status_writes(&self, n: usize) {
        self.state.lock().unwrap().conflicts = n;
    }

    /// Simulate an external edit of the run
    pub(crate) fn touch(&self) {
        if let Some(run) = self.state.lock().unwrap().run.as_mut() {
            bump_resource_version(run);
        }
    }

    /// Simulate the user deleting the run
    pub(crate) fn delete_run(&self) {
        self.state.lock().unwrap().run = None;
    }

    pub(crate) fn exists(&self, kind: DescriptorKind, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .objects
            .contains(&(kind, name.to_string()))
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub(crate) fn creates(&self) -> Vec<(DescriptorKind, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(kind, name) => Some((kind, name)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn deletes(&self) -> Vec<(DescriptorKind, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(kind, name) => Some((kind, name)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn events(&self) -> Vec<(Severity, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Event(severity, reason) => Some((severity, reason)),
                _ => None,
            })
            .collect()
    }

    fn observe(&self, call: Call, kind: DescriptorKind, name: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state.objects.contains(&(kind, name.to_string())) && state.ready.contains(name)
    }
}

#[async_trait]
impl ClusterAccess for FakeCluster {
    async fn get(&self, _identity: &RunIdentity) -> Result<Option<BenchmarkRun>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get);
        Ok(state.run.clone())
    }

    async fn create_if_absent(&self, descriptor: &Descriptor) -> Result<CreateOutcome, Error> {
        let key = (descriptor.kind(), descriptor.name().to_string());
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(key.0, key.1.clone()));
        if state.objects.insert(key) {
            Ok(CreateOutcome::Created)
        } else {
            Ok(CreateOutcome::AlreadyExists)
        }
    }

    async fn delete_if_present(&self, descriptor: &Descriptor) -> Result<DeleteOutcome, Error> {
        let key = (descriptor.kind(), descriptor.name().to_string());
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(key.0, key.1.clone()));
        if state.objects.remove(&key) {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Gone)
        }
    }

    async fn update_status(
        &self,
        run: &BenchmarkRun,
        status: &BenchmarkStatus,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UpdateStatus(status.clone()));
        if state.conflicts > 0 {
            state.conflicts -= 1;
            return Err(conflict());
        }
        let Some(stored) = state.run.as_mut() else {
            return Err(Error::from(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: "not found".to_string(),
                reason: "NotFound".to_string(),
                code: 404,
            })));
        };
        if stored.resource_version() != run.resource_version() {
            return Err(conflict());
        }
        set_status(stored, status.clone());
        bump_resource_version(stored);
        Ok(())
    }

    async fn record_event(
        &self,
        _run: &BenchmarkRun,
        severity: Severity,
        reason: &str,
        _message: String,
    ) {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::Event(severity, reason.to_string()));
    }

    async fn deployment_ready(&self, _namespace: &str, name: &str) -> Result<bool, Error> {
        Ok(self.observe(
            Call::DeploymentReady(name.to_string()),
            DescriptorKind::ServerWorkload,
            name,
        ))
    }

    async fn endpoint_ready(&self, _namespace: &str, name: &str) -> Result<bool, Error> {
        Ok(self.observe(
            Call::EndpointReady(name.to_string()),
            DescriptorKind::ServerEndpoint,
            name,
        ))
    }

    async fn job_finished(&self, _namespace: &str, name: &str) -> Result<bool, Error> {
        let succeeded = self.observe(
            Call::JobFinished(name.to_string()),
            DescriptorKind::ClientWorkload,
            name,
        );
        let state = self.state.lock().unwrap();
        let failed = state
            .objects
            .contains(&(DescriptorKind::ClientWorkload, name.to_string()))
            && state.failed.contains(name);
        Ok(succeeded || failed)
    }
}
