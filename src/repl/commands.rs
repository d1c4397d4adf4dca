//! REPL command dispatch

use tracing::debug;

use crate::error::Result;
use crate::output::{format_history, format_removals, format_result, short_id, OutputFormat};
use crate::parser::ReplCommand;
use crate::workspace::Workspace;

pub const HELP: &str = "\
cyclops - help
:h, :help                     show help
:f, :from      [image]        set base image
:e, :eval      [command ...]  execute shell command (ephemeral)
:r, :run       [command ...]  execute shell command (auto commits image)
:c, :commit                   commit changes from last command
:b, :back      [num]          go back in the history (default: 1)
:hs, :history                 show the current history
:p, :print                    print the current build script
:w, :write     [path/to/file] write state to file
:q, :quit                     quit cyclops - <ctrl-d>
";

/// Apply `cmd` to the workspace and render what should be shown.
///
/// `Quit` and `Empty` are no-ops here; the loop owns those. `From` wipes the
/// history unconditionally, so any confirmation must happen before.
pub async fn execute(ws: &mut Workspace, cmd: &ReplCommand, format: &OutputFormat) -> Result<String> {
    debug!(command = cmd.name(), "executing");
    match cmd {
        ReplCommand::Empty | ReplCommand::Quit => Ok(String::new()),
        ReplCommand::Help => Ok(HELP.to_string()),
        ReplCommand::Eval(command) => {
            let res = ws.eval(command).await?;
            Ok(format_result(&res, format))
        }
        ReplCommand::Run(command) => {
            let res = ws.run(command).await?;
            Ok(format_result(&res, format))
        }
        ReplCommand::Commit => {
            let image = ws.commit_last().await?;
            Ok(format!("Committed: {}", short_id(&image)))
        }
        ReplCommand::From(image) => {
            let outcomes = ws.clear().await;
            let mut output = format_removals(&outcomes, format);
            ws.set_image(image).await?;
            output.push_str(&format!("Image: {}", image));
            Ok(output)
        }
        ReplCommand::Back(n) => {
            ws.back(*n).await?;
            Ok(format!("Back {} to {}", n, short_id(ws.current_image())))
        }
        ReplCommand::History => Ok(format_history(ws, format)),
        ReplCommand::Print => Ok(ws.sprint().join("\n")),
        ReplCommand::Write(path) => {
            ws.write(path)?;
            Ok(format!("File written: {}", path.display()))
        }
    }
}

/// The head has moved away from the base, so rebasing would discard work
pub fn needs_confirmation(ws: &Workspace, cmd: &ReplCommand) -> bool {
    matches!(cmd, ReplCommand::From(_)) && ws.current_image() != ws.base_image()
}

/// Say goodbye to every container the session left behind
pub async fn clean_up(ws: &mut Workspace, format: &OutputFormat) -> String {
    let outcomes = ws.reset().await;
    format_removals(&outcomes, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::error::CyclopsError;
    use crate::parser::parse_command;
    use crate::workspace::WorkspaceConfig;
    use std::sync::Arc;

    fn workspace(engine: &Arc<MemoryEngine>) -> Workspace {
        Workspace::new(engine.clone(), "ubuntu:trusty", WorkspaceConfig::default())
    }

    async fn exec(ws: &mut Workspace, line: &str) -> Result<String> {
        let cmd = parse_command(line)?;
        execute(ws, &cmd, &OutputFormat::Human).await
    }

    #[tokio::test]
    async fn test_session_flow() {
        let engine = Arc::new(MemoryEngine::new());
        let mut ws = workspace(&engine);

        let output = exec(&mut ws, ":r touch /tmp/foo").await.unwrap();
        assert!(output.contains("Exit: 0"));
        assert!(output.contains("Committed: i1"));

        exec(&mut ws, "ls /tmp").await.unwrap();
        assert_eq!(exec(&mut ws, ":p").await.unwrap(), "FROM ubuntu:trusty\nRUN touch /tmp/foo");

        assert_eq!(exec(&mut ws, ":c").await.unwrap(), "Committed: i2");
        assert_eq!(ws.current_image(), "i2");

        assert_eq!(exec(&mut ws, ":b").await.unwrap(), "Back 1 to i1");
        assert_eq!(exec(&mut ws, ":b 1").await.unwrap(), "Back 1 to ubuntu:trusty");
    }

    #[tokio::test]
    async fn test_commit_errors_surface() {
        let engine = Arc::new(MemoryEngine::new());
        let mut ws = workspace(&engine);

        let err = exec(&mut ws, ":c").await.unwrap_err();
        assert!(matches!(err, CyclopsError::EmptyHistory));

        exec(&mut ws, ":r true").await.unwrap();
        let err = exec(&mut ws, ":commit").await.unwrap_err();
        assert!(matches!(err, CyclopsError::AlreadyCommitted));
    }

    #[tokio::test]
    async fn test_from_wipes_history() {
        let engine = Arc::new(MemoryEngine::new().with_image("alpine"));
        let mut ws = workspace(&engine);

        exec(&mut ws, ":r cmd1").await.unwrap();
        let cmd = parse_command(":f alpine").unwrap();
        assert!(needs_confirmation(&ws, &cmd));

        let output = execute(&mut ws, &cmd, &OutputFormat::Human).await.unwrap();
        assert!(output.contains("Deleted: c1"));
        assert!(output.ends_with("Image: alpine"));
        assert!(ws.history().is_empty());
        assert_eq!(ws.current_image(), "alpine");
        assert!(!needs_confirmation(&ws, &cmd));
    }

    #[tokio::test]
    async fn test_write_and_cleanup() {
        let engine = Arc::new(MemoryEngine::new());
        let mut ws = workspace(&engine);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Dockerfile");

        exec(&mut ws, ":r cmd1").await.unwrap();
        let output = exec(&mut ws, &format!(":w {}", path.display())).await.unwrap();
        assert!(output.starts_with("File written:"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "FROM ubuntu:trusty\nRUN cmd1\n"
        );

        let output = clean_up(&mut ws, &OutputFormat::Human).await;
        assert_eq!(output, "Deleted: c1\n");
        assert!(engine.containers().is_empty());
    }
}
