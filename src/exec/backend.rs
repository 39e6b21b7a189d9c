// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The [`Executor`](super::Executor) never touches `tokio::process` directly;
//! it hands a [`LaunchRequest`] to a `ProcessBackend` and gets back a
//! [`ProcessOutcome`]. This makes it easy to swap in a fake backend in tests
//! while keeping the production implementation in [`RealProcessBackend`].

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{AutomanError, Result};

/// Everything needed to start one child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Hard wall-clock limit; the child is killed when it is exceeded.
    pub timeout: Duration,
}

/// How a launched child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process exited on its own. `code` is `None` when it was killed by
    /// a signal.
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The timeout elapsed; the process has been killed and reaped.
    TimedOut,
}

/// Trait abstracting how child processes are launched and awaited.
///
/// Production code uses [`RealProcessBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessBackend: Send + Sync {
    /// Run the request to completion (or timeout).
    ///
    /// An `Err` means the process could not be started or awaited at all.
    fn launch(
        &self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>>;
}

/// Real backend built on `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct RealProcessBackend;

impl RealProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessBackend for RealProcessBackend {
    fn launch(
        &self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>> {
        Box::pin(run_child(request))
    }
}

async fn run_child(request: LaunchRequest) -> Result<ProcessOutcome> {
    let deadline = Instant::now() + request.timeout;

    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args)
        .current_dir(&request.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| AutomanError::Spawn {
        program: request.program.clone(),
        source,
    })?;

    info!(
        program = %request.program,
        pid = child.id(),
        cwd = ?request.working_dir,
        "child process started"
    );

    // Drain both pipes concurrently so a chatty child never blocks on a full
    // pipe buffer.
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res?;
            debug!(program = %request.program, ?status, "child process exited");

            // A grandchild may still hold the pipes open; never wait past the
            // deadline for them.
            match collect_until(deadline, stdout, stderr).await {
                Some((stdout, stderr)) => Ok(ProcessOutcome::Exited {
                    code: status.code(),
                    stdout,
                    stderr,
                }),
                None => {
                    warn!(program = %request.program, "output pipes still open at deadline");
                    Ok(ProcessOutcome::TimedOut)
                }
            }
        }

        _ = tokio::time::sleep_until(deadline) => {
            warn!(
                program = %request.program,
                timeout_ms = request.timeout.as_millis() as u64,
                "child process exceeded timeout; killing"
            );
            // `kill` also waits for the process, so nothing is left behind
            // once this returns.
            if let Err(e) = child.kill().await {
                warn!(program = %request.program, error = %e, "failed to kill child process");
            }
            stdout.abort();
            stderr.abort();
            Ok(ProcessOutcome::TimedOut)
        }
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!(error = %e, "error reading child output");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Wait for both readers until `deadline`.
///
/// On expiry the readers are aborted and awaited, so their pipe ends are
/// closed by the time this returns `None`.
async fn collect_until(
    deadline: Instant,
    mut stdout: JoinHandle<String>,
    mut stderr: JoinHandle<String>,
) -> Option<(String, String)> {
    let collected = tokio::time::timeout_at(deadline, async {
        ((&mut stdout).await, (&mut stderr).await)
    })
    .await;

    match collected {
        Ok((out, err)) => Some((out.unwrap_or_default(), err.unwrap_or_default())),
        Err(_) => {
            stdout.abort();
            stderr.abort();
            let _ = stdout.await;
            let _ = stderr.await;
            None
        }
    }
}
