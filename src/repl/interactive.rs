//! Interactive REPL implementation

use std::sync::{Arc, Mutex};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::commands::{clean_up, execute, needs_confirmation};
use super::ReplOptions;
use crate::error::{CyclopsError, Result};
use crate::parser::{parse_command, ReplCommand};
use crate::workspace::Workspace;

const PROMPT: &str = "cyclops> ";

pub async fn run_repl(ws: &mut Workspace, options: &ReplOptions) -> Result<()> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| CyclopsError::IoError(std::io::Error::other(e.to_string())))?;

    if let Err(e) = rl.load_history(&options.history_file) {
        debug!(path = %options.history_file.display(), error = %e, "no input history loaded");
    }

    // Ctrl-C while a command runs stops its container instead of killing us
    let current = Arc::new(Mutex::new(CancellationToken::new()));
    {
        let current = current.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            if let Ok(token) = current.lock() {
                token.cancel();
            }
        }) {
            warn!(error = %e, "could not install interrupt handler");
        }
    }

    println!("Cyclops v{} - image: {}", env!("CARGO_PKG_VERSION"), ws.current_image());
    println!("Type ':h' for commands, ':q' to quit\n");

    loop {
        let readline = tokio::task::block_in_place(|| rl.readline(PROMPT));
        let input = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        };

        let cmd = match parse_command(input.trim()) {
            Ok(ReplCommand::Empty) => continue,
            Ok(ReplCommand::Quit) => break,
            Ok(cmd) => cmd,
            Err(CyclopsError::ParseError(msg)) => {
                eprintln!("{}\n", msg);
                continue;
            }
            Err(e) => {
                eprintln!("Error: {}\n", e);
                continue;
            }
        };

        if needs_confirmation(ws, &cmd) {
            let confirm = tokio::task::block_in_place(|| {
                rl.readline("Changes will be lost. Continue? <y>: ")
            });
            if !matches!(confirm.as_deref().map(str::trim), Ok("y")) {
                println!("Aborted\n");
                continue;
            }
            println!("Wiping history to set new base image");
        }

        let token = CancellationToken::new();
        if let Ok(mut guard) = current.lock() {
            *guard = token.clone();
        }
        ws.set_cancellation(token);

        match execute(ws, &cmd, &options.format).await {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{}\n", output.trim_end());
                }
            }
            Err(e) => eprintln!("Error: {}\n", e),
        }

        let _ = rl.add_history_entry(input.as_str());
        if let Err(e) = rl.save_history(&options.history_file) {
            eprintln!("error writing history: {}", e);
        }
    }

    println!("Cleaning up...");
    let output = clean_up(ws, &options.format).await;
    if !output.is_empty() {
        print!("{}", output);
    }
    println!("Done");
    Ok(())
}
