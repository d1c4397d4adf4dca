//! The record of one command execution

use std::borrow::Cow;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::engine::Change;

/// One attempt to run a command in a container
#[derive(Debug, Clone, Serialize)]
pub struct EvalResult {
    /// The shell command that was executed
    pub command: String,
    /// Image the command ran against
    pub image: String,
    /// Image the container was committed to, once committed
    pub new_image: Option<String>,
    /// Workspace base image at dispatch time
    pub base_image: String,
    pub code: i64,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub started_at: DateTime<Utc>,
    /// Combined stdout and stderr
    #[serde(skip)]
    pub log: Vec<u8>,
    /// Raw change-set relative to `image`
    pub changes: Vec<Change>,
    pub container_id: String,
    /// Tombstoned out of the active lineage
    pub deleted: bool,
    /// The backing container has been removed from the engine
    pub removed: bool,
    /// The command ran and exited; false for abandoned dispatches
    pub completed: bool,
}

impl EvalResult {
    /// Entry for a dispatch that failed after its container was created
    pub(crate) fn abandoned(command: &str, image: &str, base_image: &str, container_id: &str) -> Self {
        Self {
            command: command.to_string(),
            image: image.to_string(),
            new_image: None,
            base_image: base_image.to_string(),
            code: -1,
            duration: Duration::ZERO,
            started_at: Utc::now(),
            log: Vec::new(),
            changes: Vec::new(),
            container_id: container_id.to_string(),
            deleted: true,
            removed: false,
            completed: false,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.code == 0
    }

    pub fn is_committed(&self) -> bool {
        self.new_image.is_some()
    }

    /// Still holds a container the engine has not removed
    pub fn needs_reclaim(&self) -> bool {
        !self.removed && !self.container_id.is_empty()
    }

    pub fn log_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.log)
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
