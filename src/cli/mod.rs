//! Command-line interface

pub mod args;

pub use args::{Args, SubCommand, DEFAULT_HISTORY_FILE, DEFAULT_IMAGE};
