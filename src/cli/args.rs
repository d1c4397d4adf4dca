//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::workspace::DEFAULT_SHELL;

pub const DEFAULT_IMAGE: &str = "ubuntu:latest";
pub const DEFAULT_HISTORY_FILE: &str = "/tmp/.cyclops_history";

#[derive(Parser)]
#[command(name = "cyclops")]
#[command(author, version, about = "Build container images one command at a time", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<SubCommand>,

    /// Container engine address (unix://, tcp://, npipe://)
    #[arg(long, env = "DOCKER_HOST", global = true)]
    pub host: Option<String>,

    /// Verify the engine with TLS (1, yes, true)
    #[arg(long, env = "DOCKER_TLS_VERIFY", global = true)]
    pub tls_verify: Option<String>,

    /// Directory holding cert.pem, key.pem and ca.pem
    #[arg(long, env = "DOCKER_CERT_PATH", global = true)]
    pub cert_path: Option<String>,

    /// Base image for the workspace
    #[arg(long, default_value = DEFAULT_IMAGE, global = true)]
    pub image: String,

    /// Shell commands are run with, as `<shell> -c <command>`
    #[arg(long, default_value = DEFAULT_SHELL, global = true)]
    pub shell: String,

    /// Host directory mounted at /work (default: current directory)
    #[arg(long, global = true)]
    pub workdir: Option<PathBuf>,

    /// Where REPL input history is kept
    #[arg(long, default_value = DEFAULT_HISTORY_FILE, global = true)]
    pub history_file: PathBuf,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Start interactive REPL mode (the default)
    Repl,

    /// Run every step of a build script, stopping at the first failure
    Replay {
        /// Path to the build script
        file: PathBuf,

        /// Write the resulting lineage to this path
        #[arg(long)]
        write: Option<PathBuf>,
    },
}
