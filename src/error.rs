//! Error types for Cyclops

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

/// The engine call that failed during a container lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleOp {
    Create,
    Attach,
    Start,
    Wait,
    Stop,
    Changes,
    Commit,
    Remove,
    Inspect,
}

impl LifecycleOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOp::Create => "create",
            LifecycleOp::Attach => "attach",
            LifecycleOp::Start => "start",
            LifecycleOp::Wait => "wait",
            LifecycleOp::Stop => "stop",
            LifecycleOp::Changes => "changes",
            LifecycleOp::Commit => "commit",
            LifecycleOp::Remove => "remove",
            LifecycleOp::Inspect => "inspect",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum CyclopsError {
    #[error("Cannot connect to container engine: {0}")]
    Connection(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Container {op} failed: {source}")]
    ContainerLifecycle {
        op: LifecycleOp,
        /// Set once the container exists, so the caller can reclaim it later
        container_id: Option<String>,
        #[source]
        source: EngineError,
    },

    #[error("Container already committed")]
    AlreadyCommitted,

    #[error("No container found to commit")]
    EmptyHistory,

    #[error("`{0}` did not run to completion, nothing to commit")]
    NotCompleted(String),

    #[error("No history that far back: requested {requested}, only {available} available")]
    OutOfRange { requested: usize, available: usize },

    #[error("Container {0} was already removed")]
    ContainerReclaimed(String),

    #[error("Error writing {}: {source}", path.display())]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CyclopsError {
    pub(crate) fn lifecycle(op: LifecycleOp, container_id: Option<&str>, source: EngineError) -> Self {
        CyclopsError::ContainerLifecycle {
            op,
            container_id: container_id.map(str::to_string),
            source,
        }
    }

    /// Container left behind by a failed lifecycle step, if any
    pub fn orphaned_container(&self) -> Option<&str> {
        match self {
            CyclopsError::ContainerLifecycle { container_id, .. } => container_id.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CyclopsError>;
