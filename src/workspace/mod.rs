//! Workspace module: the image lineage state machine
//!
//! Each history entry moves through created, completed, optionally
//! committed, and finally deleted. Entries are never spliced out; undo and
//! reset only tombstone them.

mod export;
#[allow(clippy::module_inception)]
mod workspace;

pub use export::render_script;
pub use workspace::{RemovalOutcome, Workspace, WorkspaceConfig, DEFAULT_SHELL};
