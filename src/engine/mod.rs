//! Container engine capability
//!
//! Everything the workspace needs from a container runtime goes through the
//! [`ContainerEngine`] trait. [`DockerEngine`] talks to a real daemon,
//! [`MemoryEngine`] is a deterministic in-process double.

pub mod docker;
pub mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use docker::{DockerConfig, DockerEngine, Transport};
pub use memory::MemoryEngine;

/// Path inside every container where the host working directory is mounted
pub const WORK_MOUNT: &str = "/work";

/// Live output of an attached container, one chunk per frame
pub type OutputStream = BoxStream<'static, EngineResult<Vec<u8>>>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No such image: {0}")]
    ImageNotFound(String),

    #[error("No such container: {0}")]
    ContainerNotFound(String),

    #[error(transparent)]
    Docker(#[from] bollard::errors::Error),

    #[error("MOCK: failed to {0}")]
    Injected(&'static str),

    #[error("{0}")]
    Other(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// What to create: an image, a command and the host binds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub cmd: Vec<String>,
    pub binds: Vec<String>,
}

impl ContainerSpec {
    /// Wrap `command` for `shell -c` and bind `host_dir` at [`WORK_MOUNT`]
    pub fn shell(image: &str, shell: &str, command: &str, host_dir: &str) -> Self {
        Self {
            image: image.to_string(),
            cmd: vec![shell.to_string(), "-c".to_string(), command.to_string()],
            binds: vec![format!("{}:{}", host_dir, WORK_MOUNT)],
        }
    }
}

/// Kind of a filesystem change, as numbered by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Modified,
    Added,
    Removed,
}

impl ChangeKind {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ChangeKind::Modified),
            1 => Some(ChangeKind::Added),
            2 => Some(ChangeKind::Removed),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            ChangeKind::Modified => '~',
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
        }
    }
}

/// One entry of a container's change-set relative to its image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
}

impl Change {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Operations the workspace consumes from a container runtime.
///
/// Implementations must be safe to share: the workspace holds the engine
/// behind an `Arc` and the eval runner drains output on a separate task.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Check the engine is reachable
    async fn ping(&self) -> EngineResult<()>;

    /// Create (but do not start) a container, returning its id
    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String>;

    async fn start_container(&self, id: &str) -> EngineResult<()>;

    /// Attach to stdout and stderr. Must be called before start to see all output.
    async fn attach_output(&self, id: &str) -> EngineResult<OutputStream>;

    /// Block until the container exits and return its exit code
    async fn wait_container(&self, id: &str) -> EngineResult<i64>;

    async fn stop_container(&self, id: &str) -> EngineResult<()>;

    /// `Ok(false)` when the image does not exist
    async fn inspect_image(&self, name: &str) -> EngineResult<bool>;

    /// Snapshot the container's filesystem into a new image, returning its id
    async fn commit_container(&self, id: &str) -> EngineResult<String>;

    async fn container_changes(&self, id: &str) -> EngineResult<Vec<Change>>;

    async fn remove_container(&self, id: &str) -> EngineResult<()>;
}
