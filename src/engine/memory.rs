//! In-memory container engine
//!
//! Deterministic stand-in for a daemon: container ids are `c1`, `c2`, ...
//! and committing `cN` produces image `iN`. Any operation can be made to
//! fail with [`MemoryEngine::fail_on`].

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Notify;

use super::{Change, ContainerEngine, ContainerSpec, EngineError, EngineResult, OutputStream};
use crate::error::LifecycleOp;

/// Exit code reported for a container stopped while waiting
pub const STOPPED_EXIT_CODE: i64 = 137;

#[derive(Debug, Default)]
struct State {
    last_id: u64,
    exit_code: i64,
    output: Vec<Vec<u8>>,
    changes: Vec<Change>,
    images: HashSet<String>,
    failures: HashSet<LifecycleOp>,
    hang_until_stopped: bool,
    created: Vec<ContainerSpec>,
    live: Vec<String>,
    committed: Vec<String>,
    removed: Vec<String>,
    stopped: Vec<String>,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: Mutex<State>,
    stop_signal: Notify,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` visible to `inspect_image`
    pub fn with_image(self, name: &str) -> Self {
        self.lock().images.insert(name.to_string());
        self
    }

    pub fn with_exit_code(self, code: i64) -> Self {
        self.set_exit_code(code);
        self
    }

    /// Chunks every attached container will emit
    pub fn with_output(self, chunks: &[&str]) -> Self {
        self.lock().output = chunks.iter().map(|c| c.as_bytes().to_vec()).collect();
        self
    }

    /// Change-set reported for every container
    pub fn with_changes(self, changes: Vec<Change>) -> Self {
        self.lock().changes = changes;
        self
    }

    /// `wait_container` blocks until `stop_container` is called
    pub fn hang_until_stopped(self) -> Self {
        self.lock().hang_until_stopped = true;
        self
    }

    pub fn set_exit_code(&self, code: i64) {
        self.lock().exit_code = code;
    }

    pub fn fail_on(&self, op: LifecycleOp) {
        self.lock().failures.insert(op);
    }

    pub fn recover(&self, op: LifecycleOp) {
        self.lock().failures.remove(&op);
    }

    /// Specs of every container ever created, in order
    pub fn created(&self) -> Vec<ContainerSpec> {
        self.lock().created.clone()
    }

    /// Ids of containers created and not yet removed
    pub fn containers(&self) -> Vec<String> {
        self.lock().live.clone()
    }

    /// Image ids produced by commits, in order
    pub fn images(&self) -> Vec<String> {
        self.lock().committed.clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.lock().removed.clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.lock().stopped.clone()
    }

    /// Every engine call as `"<op> <target>"`, in order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and apply any injected failure
    fn enter(&self, op: LifecycleOp, target: &str) -> EngineResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(format!("{} {}", op, target));
        if state.failures.contains(&op) {
            return Err(EngineError::Injected(op.as_str()));
        }
        Ok(state)
    }

    fn require_live(state: &State, id: &str) -> EngineResult<()> {
        if state.live.iter().any(|c| c == id) {
            Ok(())
        } else {
            Err(EngineError::ContainerNotFound(id.to_string()))
        }
    }
}

#[async_trait]
impl ContainerEngine for MemoryEngine {
    async fn ping(&self) -> EngineResult<()> {
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String> {
        let mut state = self.enter(LifecycleOp::Create, &spec.image)?;
        state.last_id += 1;
        let id = format!("c{}", state.last_id);
        state.created.push(spec.clone());
        state.live.push(id.clone());
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> EngineResult<()> {
        let state = self.enter(LifecycleOp::Start, id)?;
        Self::require_live(&state, id)
    }

    async fn attach_output(&self, id: &str) -> EngineResult<OutputStream> {
        let state = self.enter(LifecycleOp::Attach, id)?;
        Self::require_live(&state, id)?;
        let chunks: Vec<EngineResult<Vec<u8>>> = state.output.iter().cloned().map(Ok).collect();
        Ok(stream::iter(chunks).boxed())
    }

    async fn wait_container(&self, id: &str) -> EngineResult<i64> {
        let hang = {
            let state = self.enter(LifecycleOp::Wait, id)?;
            Self::require_live(&state, id)?;
            state.hang_until_stopped
        };
        if hang {
            self.stop_signal.notified().await;
            return Ok(STOPPED_EXIT_CODE);
        }
        Ok(self.lock().exit_code)
    }

    async fn stop_container(&self, id: &str) -> EngineResult<()> {
        {
            let mut state = self.enter(LifecycleOp::Stop, id)?;
            Self::require_live(&state, id)?;
            state.stopped.push(id.to_string());
        }
        self.stop_signal.notify_one();
        Ok(())
    }

    async fn inspect_image(&self, name: &str) -> EngineResult<bool> {
        let state = self.enter(LifecycleOp::Inspect, name)?;
        Ok(state.images.contains(name) || state.committed.iter().any(|i| i == name))
    }

    async fn commit_container(&self, id: &str) -> EngineResult<String> {
        let mut state = self.enter(LifecycleOp::Commit, id)?;
        Self::require_live(&state, id)?;
        let image = id.replacen('c', "i", 1);
        state.committed.push(image.clone());
        Ok(image)
    }

    async fn container_changes(&self, id: &str) -> EngineResult<Vec<Change>> {
        let state = self.enter(LifecycleOp::Changes, id)?;
        Self::require_live(&state, id)?;
        Ok(state.changes.clone())
    }

    async fn remove_container(&self, id: &str) -> EngineResult<()> {
        let mut state = self.enter(LifecycleOp::Remove, id)?;
        Self::require_live(&state, id)?;
        state.live.retain(|c| c != id);
        state.removed.push(id.to_string());
        Ok(())
    }
}
