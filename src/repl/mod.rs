//! REPL module for interactive mode

pub mod commands;
#[cfg(feature = "repl")]
pub mod interactive;

use std::path::PathBuf;

use crate::cli::DEFAULT_HISTORY_FILE;
use crate::output::OutputFormat;

pub use commands::{execute, HELP};
#[cfg(feature = "repl")]
pub use interactive::run_repl;

#[derive(Debug, Clone)]
pub struct ReplOptions {
    /// Input history, loaded at start and rewritten after each command
    pub history_file: PathBuf,
    pub format: OutputFormat,
}

impl Default for ReplOptions {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            format: OutputFormat::Human,
        }
    }
}

#[cfg(not(feature = "repl"))]
pub async fn run_repl(
    _ws: &mut crate::workspace::Workspace,
    _options: &ReplOptions,
) -> crate::error::Result<()> {
    Err(crate::error::CyclopsError::IoError(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "REPL not enabled. Rebuild with --features repl",
    )))
}
