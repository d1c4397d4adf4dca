//! Cyclops CLI - build container images one command at a time

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use cyclops::cli::{Args, SubCommand};
use cyclops::engine::{ContainerEngine, DockerConfig, DockerEngine};
use cyclops::output::{format_removals, format_result, OutputFormat};
use cyclops::repl::{run_repl, ReplOptions};
use cyclops::script::{replay, BuildScript};
use cyclops::workspace::{Workspace, WorkspaceConfig};
use cyclops::{telemetry, CyclopsError};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    telemetry::init_tracing(args.verbose, args.json);

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let format = if args.json { OutputFormat::Json } else { OutputFormat::Human };
    let command = args.command.unwrap_or(SubCommand::Repl);

    // Bad scripts fail before any daemon is involved
    let script = match &command {
        SubCommand::Replay { file, .. } => Some(
            BuildScript::from_file(file).with_context(|| format!("loading {}", file.display()))?,
        ),
        SubCommand::Repl => None,
    };

    let config = DockerConfig::resolve(
        args.host.as_deref(),
        args.tls_verify.as_deref(),
        args.cert_path.as_deref(),
    )?;
    let engine = DockerEngine::connect(&config)?;
    engine
        .ping()
        .await
        .map_err(|e| CyclopsError::Connection(e.to_string()))?;
    if !args.json {
        println!("Connected to docker daemon...");
    }

    let ws_config = workspace_config(args.shell, args.workdir, args.json)?;

    match (command, script) {
        (SubCommand::Replay { write, .. }, Some(script)) => {
            let mut ws = Workspace::new(Arc::new(engine), &script.from, ws_config);
            let report = replay(&mut ws, &script).await;

            if let Ok(report) = &report {
                for res in &report.results {
                    println!("{}", format_result(res, &format));
                }
                if let Some(path) = write {
                    ws.write(&path)?;
                    println!("File written: {}", path.display());
                }
            }

            let removals = ws.reset().await;
            print!("{}", format_removals(&removals, &format));

            let report = report?;
            if !report.success {
                return Err(anyhow!(
                    "replay stopped after {} of {} steps: {}",
                    report.steps_executed,
                    report.total_steps,
                    report.error.unwrap_or_default()
                ));
            }
            Ok(())
        }
        _ => {
            let mut ws = Workspace::new(Arc::new(engine), &args.image, ws_config);
            let options = ReplOptions {
                history_file: args.history_file,
                format,
            };
            run_repl(&mut ws, &options).await?;
            Ok(())
        }
    }
}

/// Container output is echoed live only in human mode; JSON results carry it in `log`
fn workspace_config(shell: String, workdir: Option<PathBuf>, json: bool) -> anyhow::Result<WorkspaceConfig> {
    Ok(WorkspaceConfig {
        shell,
        host_dir: host_dir(workdir)?,
        live_output: !json,
    })
}

fn host_dir(workdir: Option<PathBuf>) -> anyhow::Result<String> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let dir = match workdir {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => cwd.join(dir),
        None => cwd,
    };
    Ok(dir.to_string_lossy().into_owned())
}
