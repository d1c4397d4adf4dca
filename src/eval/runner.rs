//! Run one command in one container
//!
//! The protocol is create, attach, start, wait, changes. Output is drained on
//! a separate task that is attached before the container starts and joined
//! before the result is returned, so the captured log is always complete.

use std::io::Write;
use std::time::Instant;

use chrono::Utc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::result::EvalResult;
use super::sink::StreamSink;
use crate::engine::{ContainerEngine, ContainerSpec, EngineError, OutputStream};
use crate::error::{CyclopsError, LifecycleOp, Result};

/// What to run and where
#[derive(Debug, Clone)]
pub struct EvalRequest<'a> {
    pub command: &'a str,
    pub image: &'a str,
    /// Interpreter used as `<shell> -c <command>`
    pub shell: &'a str,
    /// Host directory bound at the work mount
    pub host_dir: &'a str,
    /// Echo output to stdout while it is produced
    pub live_output: bool,
}

/// Execute `request` and collect its result.
///
/// Never commits or removes the container. On failure the error carries the
/// id of any container already created; reclaiming it is up to the caller.
/// Cancelling `cancel` while the container runs asks the engine to stop it,
/// and the result then carries whatever exit code the stop produced.
pub async fn eval(
    engine: &dyn ContainerEngine,
    request: &EvalRequest<'_>,
    cancel: &CancellationToken,
) -> Result<EvalResult> {
    let spec = ContainerSpec::shell(request.image, request.shell, request.command, request.host_dir);
    let started_at = Utc::now();

    let id = engine
        .create_container(&spec)
        .await
        .map_err(|e| CyclopsError::lifecycle(LifecycleOp::Create, None, e))?;
    debug!(container_id = %id, image = request.image, command = request.command, "container created");

    let output = engine
        .attach_output(&id)
        .await
        .map_err(|e| CyclopsError::lifecycle(LifecycleOp::Attach, Some(&id), e))?;
    let sink = if request.live_output {
        StreamSink::stdout()
    } else {
        StreamSink::capture()
    };
    let drain = tokio::spawn(drain_output(output, sink));

    let start = Instant::now();
    if let Err(e) = engine.start_container(&id).await {
        drain.abort();
        return Err(CyclopsError::lifecycle(LifecycleOp::Start, Some(&id), e));
    }

    let code = match wait_for_exit(engine, &id, cancel).await {
        Ok(code) => code,
        Err(e) => {
            drain.abort();
            return Err(e);
        }
    };
    let duration = start.elapsed();

    let sink = drain.await.map_err(|e| {
        CyclopsError::lifecycle(
            LifecycleOp::Attach,
            Some(&id),
            EngineError::Other(format!("output task failed: {}", e)),
        )
    })?;

    let changes = engine
        .container_changes(&id)
        .await
        .map_err(|e| CyclopsError::lifecycle(LifecycleOp::Changes, Some(&id), e))?;

    info!(container_id = %id, code, elapsed_ms = duration.as_millis() as u64, "command finished");

    Ok(EvalResult {
        command: request.command.to_string(),
        image: request.image.to_string(),
        new_image: None,
        base_image: String::new(),
        code,
        duration,
        started_at,
        log: sink.into_bytes(),
        changes,
        container_id: id,
        deleted: false,
        removed: false,
        completed: true,
    })
}

async fn wait_for_exit(engine: &dyn ContainerEngine, id: &str, cancel: &CancellationToken) -> Result<i64> {
    let wait = engine.wait_container(id);
    tokio::pin!(wait);

    tokio::select! {
        code = &mut wait => {
            return code.map_err(|e| CyclopsError::lifecycle(LifecycleOp::Wait, Some(id), e));
        }
        _ = cancel.cancelled() => {}
    }

    info!(container_id = %id, "interrupted, stopping container");
    engine
        .stop_container(id)
        .await
        .map_err(|e| CyclopsError::lifecycle(LifecycleOp::Stop, Some(id), e))?;

    wait.await
        .map_err(|e| CyclopsError::lifecycle(LifecycleOp::Wait, Some(id), e))
}

async fn drain_output(mut output: OutputStream, mut sink: StreamSink) -> StreamSink {
    while let Some(frame) = output.next().await {
        match frame {
            Ok(chunk) => {
                if let Err(e) = sink.write_all(&chunk) {
                    warn!(error = %e, "failed to buffer container output");
                }
            }
            Err(e) => {
                warn!(error = %e, "container output stream broke off");
                break;
            }
        }
    }
    let _ = sink.flush();
    sink
}
