// ABOUTME: In-memory fake daemon used by the integration tests.
// ABOUTME: Records every operation and fails on command at scripted stages.
#![allow(dead_code)]

use async_trait::async_trait;
use molt::report::{ReportEvent, ReportSink};
use molt::runtime::{
    ContainerError, ContainerFilters, ContainerOps, ContainerSnapshot, ContainerSummary,
    ImageError, ImageOps, NewContainerSpec,
};
use molt::types::{ContainerId, ImageId, ImageRef};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

struct FakeContainer {
    snapshot: ContainerSnapshot,
    running: bool,
}

#[derive(Default)]
struct FakeState {
    containers: Vec<FakeContainer>,
    created: Vec<NewContainerSpec>,
    /// Digest a reference currently resolves to, keyed by the digest-free
    /// reference string (e.g. `app:1.0`).
    latest: HashMap<String, ImageId>,
    ops: Vec<String>,
    fail_list: bool,
    fail_inspect: HashSet<String>,
    fail_stop: HashSet<String>,
    fail_remove: HashSet<String>,
    fail_create: HashSet<String>,
    fail_start: HashSet<String>,
    fail_pull: HashSet<String>,
    fail_resolve: HashSet<String>,
    delay_stop: HashMap<String, Duration>,
    delay_resolve: HashMap<String, Duration>,
    next_id: usize,
}

/// A scriptable in-memory daemon. Containers, image digests, and failures
/// are all plain data; every call appends to an operation log so tests can
/// assert ordering.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_running(&self, snapshot: ContainerSnapshot) {
        self.state.lock().containers.push(FakeContainer {
            snapshot,
            running: true,
        });
    }

    /// Point `reference` (digest-free form) at `digest`.
    pub fn set_latest(&self, reference: &str, digest: &str) {
        self.state
            .lock()
            .latest
            .insert(reference.to_string(), ImageId::new(digest));
    }

    pub fn fail_list(&self) {
        self.state.lock().fail_list = true;
    }

    pub fn fail_inspect(&self, name: &str) {
        self.state.lock().fail_inspect.insert(name.to_string());
    }

    pub fn fail_stop(&self, name: &str) {
        self.state.lock().fail_stop.insert(name.to_string());
    }

    pub fn fail_remove(&self, name: &str) {
        self.state.lock().fail_remove.insert(name.to_string());
    }

    pub fn fail_create(&self, name: &str) {
        self.state.lock().fail_create.insert(name.to_string());
    }

    pub fn fail_start(&self, name: &str) {
        self.state.lock().fail_start.insert(name.to_string());
    }

    pub fn fail_pull(&self, reference: &str) {
        self.state.lock().fail_pull.insert(reference.to_string());
    }

    pub fn fail_resolve(&self, reference: &str) {
        self.state.lock().fail_resolve.insert(reference.to_string());
    }

    /// Make `stop_container` hang for `delay` before answering.
    pub fn delay_stop(&self, name: &str, delay: Duration) {
        self.state.lock().delay_stop.insert(name.to_string(), delay);
    }

    /// Make `resolve_digest` hang for `delay` before answering.
    pub fn delay_resolve(&self, reference: &str, delay: Duration) {
        self.state
            .lock()
            .delay_resolve
            .insert(reference.to_string(), delay);
    }

    /// The operation log, e.g. `["stop:web", "remove:web", ...]`.
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().ops.clone()
    }

    pub fn running_names(&self) -> Vec<String> {
        self.state
            .lock()
            .containers
            .iter()
            .filter(|c| c.running)
            .map(|c| c.snapshot.name.clone())
            .collect()
    }

    pub fn created_specs(&self) -> Vec<NewContainerSpec> {
        self.state.lock().created.clone()
    }

    fn name_of(state: &FakeState, id: &ContainerId) -> Option<String> {
        state
            .containers
            .iter()
            .find(|c| c.snapshot.id == *id)
            .map(|c| c.snapshot.name.clone())
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn list_running(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut state = self.state.lock();
        if state.fail_list {
            return Err(ContainerError::Connection("daemon unreachable".into()));
        }
        state.ops.push("list".to_string());
        Ok(state
            .containers
            .iter()
            .filter(|c| c.running)
            .filter(|c| {
                filters
                    .name
                    .as_deref()
                    .is_none_or(|f| c.snapshot.name.contains(f))
            })
            .map(|c| ContainerSummary {
                id: c.snapshot.id.clone(),
                name: c.snapshot.name.clone(),
                image: c.snapshot.image_ref.clone(),
            })
            .collect())
    }

    async fn inspect_container(
        &self,
        id: &ContainerId,
    ) -> Result<ContainerSnapshot, ContainerError> {
        let mut state = self.state.lock();
        let name =
            Self::name_of(&state, id).ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        state.ops.push(format!("inspect:{name}"));
        if state.fail_inspect.contains(&name) {
            return Err(ContainerError::Runtime(format!("inspect failed: {name}")));
        }
        Ok(state
            .containers
            .iter()
            .find(|c| c.snapshot.id == *id)
            .map(|c| c.snapshot.clone())
            .unwrap())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let (name, delay) = {
            let mut state = self.state.lock();
            let name = Self::name_of(&state, id)
                .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
            state.ops.push(format!("stop:{name}"));
            let delay = state.delay_stop.get(&name).copied();
            (name, delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock();
        if state.fail_stop.contains(&name) {
            return Err(ContainerError::Runtime(format!("stop failed: {name}")));
        }
        state
            .containers
            .iter_mut()
            .find(|c| c.snapshot.id == *id)
            .unwrap()
            .running = false;
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        let name =
            Self::name_of(&state, id).ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        state.ops.push(format!("remove:{name}"));
        if state.fail_remove.contains(&name) {
            return Err(ContainerError::Runtime(format!("remove failed: {name}")));
        }
        state.containers.retain(|c| c.snapshot.id != *id);
        Ok(())
    }

    async fn create_container(
        &self,
        spec: &NewContainerSpec,
    ) -> Result<ContainerId, ContainerError> {
        let mut state = self.state.lock();
        state.ops.push(format!("create:{}", spec.name));
        if state.fail_create.contains(&spec.name) {
            return Err(ContainerError::Runtime(format!(
                "create failed: {}",
                spec.name
            )));
        }
        state.next_id += 1;
        let id = ContainerId::new(format!("fake-{}", state.next_id));
        let image_id = spec
            .image
            .digest()
            .map(ImageId::new)
            .or_else(|| {
                state
                    .latest
                    .get(&spec.image.without_digest().to_string())
                    .cloned()
            })
            .unwrap_or_else(|| ImageId::new("sha256:unknown"));
        state.created.push(spec.clone());
        state.containers.push(FakeContainer {
            snapshot: ContainerSnapshot {
                id: id.clone(),
                name: spec.name.clone(),
                image_ref: spec.image.to_string(),
                image_id,
                command: spec.command.clone(),
                entrypoint: spec.entrypoint.clone(),
                host_config: spec.host_config.clone(),
                labels: spec.labels.clone(),
            },
            running: false,
        });
        Ok(id)
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        let name =
            Self::name_of(&state, id).ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        state.ops.push(format!("start:{name}"));
        if state.fail_start.contains(&name) {
            return Err(ContainerError::Runtime(format!("start failed: {name}")));
        }
        state
            .containers
            .iter_mut()
            .find(|c| c.snapshot.id == *id)
            .unwrap()
            .running = true;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let mut state = self.state.lock();
        let key = reference.to_string();
        state.ops.push(format!("pull:{key}"));
        if state.fail_pull.contains(&key) {
            return Err(ImageError::PullFailed(key));
        }
        Ok(())
    }

    async fn resolve_digest(&self, reference: &ImageRef) -> Result<ImageId, ImageError> {
        let key = reference.to_string();
        let delay = {
            let mut state = self.state.lock();
            state.ops.push(format!("resolve:{key}"));
            state.delay_resolve.get(&key).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock();
        if state.fail_resolve.contains(&key) {
            return Err(ImageError::Runtime(format!("resolve failed: {key}")));
        }
        state
            .latest
            .get(&key)
            .cloned()
            .ok_or(ImageError::NotFound(key))
    }
}

/// Sink that records every event it is handed.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn send(&self, event: &ReportEvent) {
        self.events.lock().push(event.clone());
    }
}

/// A running container snapshot with a distinctive host configuration so
/// fidelity assertions have something to bite on.
pub fn snapshot(name: &str, image_ref: &str, digest: &str) -> ContainerSnapshot {
    use bollard::models::{HostConfig, RestartPolicy, RestartPolicyNameEnum};

    ContainerSnapshot {
        id: ContainerId::new(format!("id-{name}")),
        name: name.to_string(),
        image_ref: image_ref.to_string(),
        image_id: ImageId::new(digest),
        command: Some(vec!["serve".to_string(), "--port=8080".to_string()]),
        entrypoint: None,
        host_config: HostConfig {
            binds: Some(vec![format!("{name}-data:/var/lib/{name}")]),
            network_mode: Some("bridge".to_string()),
            memory: Some(256 * 1024 * 1024),
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::UNLESS_STOPPED),
                maximum_retry_count: None,
            }),
            ..Default::default()
        },
        labels: HashMap::from([("app".to_string(), name.to_string())]),
    }
}
