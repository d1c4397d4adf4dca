//! Cyclops - build container images one command at a time
//!
//! Every command runs in a fresh container on top of the current image.
//! Successful runs are committed and become the next layer; anything can be
//! undone with `back`, and the resulting lineage exported as a build script.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cyclops::{DockerConfig, DockerEngine, Workspace, WorkspaceConfig, OutputFormat, format_result};
//!
//! # async fn demo() -> cyclops::Result<()> {
//! let engine = DockerEngine::connect(&DockerConfig::resolve(None, None, None)?)?;
//! let mut ws = Workspace::new(Arc::new(engine), "ubuntu:latest", WorkspaceConfig::default());
//! let res = ws.run("apt-get update").await?;
//! println!("{}", format_result(&res, &OutputFormat::Human));
//! ws.reset().await;
//! # Ok(())
//! # }
//! ```

pub mod changes;
pub mod cli;
pub mod engine;
pub mod error;
pub mod eval;
pub mod output;
pub mod parser;
pub mod repl;
pub mod script;
pub mod telemetry;
pub mod workspace;

pub use changes::prune_changes;
pub use engine::{Change, ChangeKind, ContainerEngine, DockerConfig, DockerEngine, MemoryEngine};
pub use error::{CyclopsError, Result};
pub use eval::EvalResult;
pub use output::{format_history, format_result, OutputFormat};
pub use parser::{parse_command, BuildScript, ReplCommand};
pub use script::{replay, ReplayReport};
pub use workspace::{Workspace, WorkspaceConfig};
