//! Replays a build script against a workspace

use tracing::{info, warn};

use crate::error::Result;
use crate::eval::EvalResult;
use crate::parser::BuildScript;
use crate::workspace::Workspace;

/// Outcome of a replay
#[derive(Debug)]
pub struct ReplayReport {
    /// One result per step that ran, including the one that stopped the replay
    pub results: Vec<EvalResult>,
    /// Steps that exited 0 and were committed
    pub steps_executed: usize,
    pub total_steps: usize,
    /// Whether every step ran and succeeded
    pub success: bool,
    /// Why the replay stopped early
    pub error: Option<String>,
}

/// Rebase `ws` on the script's image and `run` each step in order.
///
/// Stops at the first step that exits non-zero or fails to run. Only a
/// failure to switch the base image is returned as an error.
pub async fn replay(ws: &mut Workspace, script: &BuildScript) -> Result<ReplayReport> {
    ws.set_image(&script.from).await?;

    let mut report = ReplayReport {
        results: Vec::new(),
        steps_executed: 0,
        total_steps: script.steps.len(),
        success: true,
        error: None,
    };

    for step in &script.steps {
        info!(line = step.line, command = %step.command, "replaying step");
        match ws.run(&step.command).await {
            Ok(res) if res.succeeded() => {
                report.steps_executed += 1;
                report.results.push(res);
            }
            Ok(res) => {
                warn!(line = step.line, code = res.code, "step failed");
                report.success = false;
                report.error = Some(format!(
                    "line {}: `{}` exited with code {}",
                    step.line, step.command, res.code
                ));
                report.results.push(res);
                break;
            }
            Err(e) => {
                warn!(line = step.line, error = %e, "step could not run");
                report.success = false;
                report.error = Some(format!("line {}: {}", step.line, e));
                break;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::error::{CyclopsError, LifecycleOp};
    use crate::workspace::WorkspaceConfig;
    use std::sync::Arc;

    fn script(source: &str) -> BuildScript {
        BuildScript::parse(source).unwrap()
    }

    #[tokio::test]
    async fn test_replay_all_steps() {
        let engine = Arc::new(MemoryEngine::new().with_image("alpine"));
        let mut ws = Workspace::new(engine.clone(), "ubuntu:trusty", WorkspaceConfig::default());

        let report = replay(&mut ws, &script("FROM alpine\nRUN cmd1\nRUN cmd2\n"))
            .await
            .unwrap();
        assert!(report.success);
        assert_eq!(report.steps_executed, 2);
        assert_eq!(report.total_steps, 2);
        assert_eq!(ws.base_image(), "alpine");
        assert_eq!(ws.current_image(), "i2");
        assert_eq!(ws.export(), vec!["FROM alpine", "RUN cmd1", "RUN cmd2"]);
    }

    #[tokio::test]
    async fn test_replay_stops_at_nonzero_exit() {
        let engine = Arc::new(MemoryEngine::new().with_image("ubuntu:trusty").with_exit_code(2));
        let mut ws = Workspace::new(engine.clone(), "ubuntu:trusty", WorkspaceConfig::default());

        let report = replay(&mut ws, &script("FROM ubuntu:trusty\nRUN false\nRUN never"))
            .await
            .unwrap();
        assert!(!report.success);
        assert_eq!(report.steps_executed, 0);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.error.as_deref(), Some("line 2: `false` exited with code 2"));
        assert_eq!(ws.history().len(), 1);
    }

    #[tokio::test]
    async fn test_replay_stops_at_engine_failure() {
        let engine = Arc::new(MemoryEngine::new().with_image("ubuntu:trusty"));
        engine.fail_on(LifecycleOp::Start);
        let mut ws = Workspace::new(engine.clone(), "ubuntu:trusty", WorkspaceConfig::default());

        let report = replay(&mut ws, &script("FROM ubuntu:trusty\nRUN cmd1\nRUN cmd2"))
            .await
            .unwrap();
        assert!(!report.success);
        assert!(report.results.is_empty());
        assert!(report.error.unwrap().starts_with("line 2: Container start failed"));
    }

    #[tokio::test]
    async fn test_replay_unknown_image() {
        let engine = Arc::new(MemoryEngine::new());
        let mut ws = Workspace::new(engine, "ubuntu:trusty", WorkspaceConfig::default());

        let err = replay(&mut ws, &script("FROM nope\nRUN ls")).await.unwrap_err();
        assert!(matches!(err, CyclopsError::ImageNotFound(_)));
    }
}
