//! Workspace struct definition
//!
//! A Workspace is one linear lineage of image layers. Every command run
//! against it is appended to an ordered history; successful runs are
//! committed and become the head the next command runs against.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{ContainerEngine, EngineError};
use crate::error::{CyclopsError, LifecycleOp, Result};
use crate::eval::{eval, EvalRequest, EvalResult};

/// Default interpreter for commands
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// How commands are executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Interpreter, invoked as `<shell> -c <command>`
    pub shell: String,
    /// Host directory mounted at the work path in every container
    pub host_dir: String,
    /// Echo container output to stdout while it runs
    pub live_output: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        let host_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self {
            shell: DEFAULT_SHELL.to_string(),
            host_dir: host_dir.to_string_lossy().into_owned(),
            live_output: false,
        }
    }
}

/// What happened to one container during a reset
#[derive(Debug)]
pub struct RemovalOutcome {
    pub container_id: String,
    pub error: Option<CyclopsError>,
}

/// One active image lineage and its history
pub struct Workspace {
    engine: Arc<dyn ContainerEngine>,
    config: WorkspaceConfig,
    /// Configured starting image
    base_image: String,
    /// Head of the lineage
    current_image: String,
    history: Vec<EvalResult>,
    cancel: CancellationToken,
}

impl Workspace {
    pub fn new(engine: Arc<dyn ContainerEngine>, image: &str, config: WorkspaceConfig) -> Self {
        Self {
            engine,
            config,
            base_image: image.to_string(),
            current_image: image.to_string(),
            history: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn base_image(&self) -> &str {
        &self.base_image
    }

    /// The image the next command runs against
    pub fn current_image(&self) -> &str {
        &self.current_image
    }

    pub fn history(&self) -> &[EvalResult] {
        &self.history
    }

    pub fn last(&self) -> Option<&EvalResult> {
        self.history.last()
    }

    /// Token observed by subsequent runs; cancelling it stops the running container
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    /// Run `command` and commit the container when it exits 0.
    ///
    /// The entry is appended whatever the exit code. A failed commit still
    /// appends the completed entry, so `commit_last` can retry it.
    pub async fn run(&mut self, command: &str) -> Result<EvalResult> {
        let mut res = self.dispatch(command).await?;

        let committed = if res.succeeded() {
            match self.engine.commit_container(&res.container_id).await {
                Ok(image) => {
                    info!(container_id = %res.container_id, image = %image, "committed");
                    res.new_image = Some(image.clone());
                    self.current_image = image;
                    Ok(())
                }
                Err(e) => Err(CyclopsError::lifecycle(LifecycleOp::Commit, Some(&res.container_id), e)),
            }
        } else {
            debug!(container_id = %res.container_id, code = res.code, "non-zero exit, not committing");
            Ok(())
        };

        self.history.push(res.clone());
        committed.map(|_| res)
    }

    /// Run `command` without committing or moving the head.
    ///
    /// The container is kept so `commit_last` can still promote it; it is
    /// reclaimed by the next `reset` or a `back` that passes over it.
    pub async fn eval(&mut self, command: &str) -> Result<EvalResult> {
        let mut res = self.dispatch(command).await?;
        res.deleted = true;
        self.history.push(res.clone());
        Ok(res)
    }

    /// Commit the most recent entry's container and make it the head
    pub async fn commit_last(&mut self) -> Result<String> {
        let last = self.history.last_mut().ok_or(CyclopsError::EmptyHistory)?;
        if last.is_committed() {
            return Err(CyclopsError::AlreadyCommitted);
        }
        if !last.completed {
            return Err(CyclopsError::NotCompleted(last.command.clone()));
        }
        if !last.needs_reclaim() {
            return Err(CyclopsError::ContainerReclaimed(last.container_id.clone()));
        }

        let image = self
            .engine
            .commit_container(&last.container_id)
            .await
            .map_err(|e| CyclopsError::lifecycle(LifecycleOp::Commit, Some(&last.container_id), e))?;

        info!(container_id = %last.container_id, image = %image, "committed last entry");
        last.new_image = Some(image.clone());
        last.deleted = false;
        self.current_image = image.clone();
        Ok(image)
    }

    /// Remove every container still held by the history and return to the base image
    pub async fn reset(&mut self) -> Vec<RemovalOutcome> {
        let mut outcomes = Vec::new();

        for entry in self.history.iter_mut() {
            if entry.needs_reclaim() {
                let container_id = entry.container_id.clone();
                let error = reclaim(self.engine.as_ref(), entry).await.err();
                if let Some(e) = &error {
                    warn!(container_id = %container_id, error = %e, "failed to remove container");
                }
                outcomes.push(RemovalOutcome { container_id, error });
            }
            entry.deleted = true;
        }

        self.current_image = self.base_image.clone();
        info!(removed = outcomes.len(), image = %self.base_image, "workspace reset");
        outcomes
    }

    /// Reset, then forget the history entirely
    pub async fn clear(&mut self) -> Vec<RemovalOutcome> {
        let outcomes = self.reset().await;
        self.history.clear();
        outcomes
    }

    /// Undo the last `n` live entries.
    ///
    /// The head moves to the image the earliest undone entry ran against.
    /// Ephemeral entries inside the span have their containers reclaimed but
    /// do not count towards `n`.
    pub async fn back(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let available = self.history.iter().filter(|e| !e.deleted).count();
        if available < n {
            return Err(CyclopsError::OutOfRange { requested: n, available });
        }

        let mut undone = 0;
        for entry in self.history.iter_mut().rev() {
            if entry.deleted {
                if let Err(e) = reclaim(self.engine.as_ref(), entry).await {
                    warn!(container_id = %entry.container_id, error = %e, "left ephemeral container for reset");
                }
                continue;
            }

            reclaim(self.engine.as_ref(), entry).await?;
            entry.deleted = true;
            self.current_image = entry.image.clone();
            undone += 1;
            if undone == n {
                break;
            }
        }

        info!(steps = n, image = %self.current_image, "moved back");
        Ok(())
    }

    /// Switch the base image.
    ///
    /// The head follows only if no work has been committed on top of the
    /// old base; otherwise the lineage is left as it is.
    pub async fn set_image(&mut self, image: &str) -> Result<()> {
        let exists = self
            .engine
            .inspect_image(image)
            .await
            .map_err(|e| CyclopsError::lifecycle(LifecycleOp::Inspect, None, e))?;
        if !exists {
            return Err(CyclopsError::ImageNotFound(image.to_string()));
        }

        if self.current_image == self.base_image {
            self.current_image = image.to_string();
        }
        self.base_image = image.to_string();
        Ok(())
    }

    /// Evaluate against the head, recording any container a failure left behind
    async fn dispatch(&mut self, command: &str) -> Result<EvalResult> {
        let request = EvalRequest {
            command,
            image: &self.current_image,
            shell: &self.config.shell,
            host_dir: &self.config.host_dir,
            live_output: self.config.live_output,
        };

        match eval(self.engine.as_ref(), &request, &self.cancel).await {
            Ok(mut res) => {
                res.base_image = self.base_image.clone();
                Ok(res)
            }
            Err(e) => {
                let container_id = e.orphaned_container().unwrap_or_default();
                let mut abandoned =
                    EvalResult::abandoned(command, &self.current_image, &self.base_image, container_id);
                if container_id.is_empty() {
                    abandoned.removed = true;
                } else {
                    warn!(container_id, error = %e, "dispatch failed, container kept for cleanup");
                }
                self.history.push(abandoned);
                Err(e)
            }
        }
    }
}

/// Remove the entry's container unless that already happened
async fn reclaim(engine: &dyn ContainerEngine, entry: &mut EvalResult) -> Result<()> {
    if !entry.needs_reclaim() {
        return Ok(());
    }

    match engine.remove_container(&entry.container_id).await {
        Ok(()) => {}
        Err(EngineError::ContainerNotFound(_)) => {
            debug!(container_id = %entry.container_id, "container already gone");
        }
        Err(e) => {
            return Err(CyclopsError::lifecycle(LifecycleOp::Remove, Some(&entry.container_id), e));
        }
    }
    entry.removed = true;
    Ok(())
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("base_image", &self.base_image)
            .field("current_image", &self.current_image)
            .field("history", &self.history.len())
            .field("config", &self.config)
            .finish()
    }
}
