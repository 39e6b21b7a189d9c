// src/exec/runner.rs

//! Blocking and background execution of automations.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::config::ExecutionConfig;
use crate::fs::FileSystem;
use crate::registry::{Descriptor, Registry};
use crate::tracking::{ExecutionRecord, ExecutionRegistry, ExecutionStatus};
use crate::types::{Completion, ExecutionId, InputValues, RunOutput};

use super::backend::{ProcessBackend, ProcessOutcome};
use super::command::{build_arguments, combine_output, launch_request};
use super::validate::{missing_required, validate_inputs, Violation};

/// Runs automations from a [`Registry`] through a [`ProcessBackend`].
///
/// No operation here returns an error: every failure is reported as a
/// [`RunOutput`] (or a [`Completion`] for background runs).
pub struct Executor {
    registry: Arc<Registry>,
    fs: Arc<dyn FileSystem>,
    backend: Arc<dyn ProcessBackend>,
    config: ExecutionConfig,
    executions: Arc<ExecutionRegistry>,
    runtime: Handle,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("executions", &self.executions)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Background runs and removal timers are spawned on `runtime`.
    pub fn new(
        registry: Arc<Registry>,
        fs: Arc<dyn FileSystem>,
        backend: Arc<dyn ProcessBackend>,
        config: ExecutionConfig,
        runtime: Handle,
    ) -> Self {
        let executions = ExecutionRegistry::new(config.cleanup_grace, runtime.clone());
        Self {
            registry,
            fs,
            backend,
            config,
            executions,
            runtime,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn executions(&self) -> &Arc<ExecutionRegistry> {
        &self.executions
    }

    /// Check `inputs` against the declared inputs of `descriptor`.
    pub fn validate(&self, descriptor: &Descriptor, inputs: &InputValues) -> Vec<Violation> {
        validate_inputs(self.fs.as_ref(), descriptor, inputs)
    }

    /// Run automation `id` and wait for it to finish.
    pub async fn run(&self, id: &str, inputs: &InputValues) -> RunOutput {
        match self.registry.get(id) {
            Some(descriptor) => {
                execute(&descriptor, inputs, self.backend.as_ref(), &self.config).await
            }
            None => not_found(id),
        }
    }

    /// [`run`](Self::run) for callers on a plain thread.
    ///
    /// Must not be called from inside the tokio runtime.
    pub fn run_blocking(&self, id: &str, inputs: &InputValues) -> RunOutput {
        self.runtime.block_on(self.run(id, inputs))
    }

    /// Start automation `id` in the background and return at once.
    ///
    /// `on_complete` is invoked exactly once: after the record has reached
    /// its terminal status and before its removal timer is armed. For an
    /// unknown id it is invoked synchronously and no record is created, but
    /// an id is still returned.
    pub fn run_async<F>(&self, id: &str, inputs: InputValues, on_complete: F) -> ExecutionId
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        let execution_id = ExecutionId::generate();

        let Some(descriptor) = self.registry.get(id) else {
            warn!(automation = %id, execution_id = %execution_id, "background run of unknown automation");
            let output = not_found(id);
            deliver(
                on_complete,
                Completion {
                    execution_id: execution_id.clone(),
                    success: output.success,
                    output: output.output,
                },
            );
            return execution_id;
        };

        self.executions.add(
            execution_id.clone(),
            ExecutionRecord::running(execution_id.clone(), &descriptor.id, &descriptor.name),
        );
        info!(automation = %descriptor.id, execution_id = %execution_id, "background run scheduled");

        let backend = Arc::clone(&self.backend);
        let config = self.config.clone();
        let executions = Arc::clone(&self.executions);
        let worker_id = execution_id.clone();

        self.runtime.spawn(async move {
            executions.mark_started(&worker_id);

            // The run itself gets its own task so a panic inside it surfaces
            // as a `JoinError` here instead of tearing down this worker.
            let automation = descriptor.id.clone();
            let run = tokio::spawn(async move {
                execute(&descriptor, &inputs, backend.as_ref(), &config).await
            });

            let (status, result) = match run.await {
                Ok(result) if result.success => (ExecutionStatus::Completed, result),
                Ok(result) => (ExecutionStatus::Failed, result),
                Err(join_err) => {
                    error!(
                        automation = %automation,
                        execution_id = %worker_id,
                        error = %join_err,
                        "background run aborted unexpectedly"
                    );
                    (
                        ExecutionStatus::Error,
                        RunOutput::failure(format!("Unexpected error: {join_err}")),
                    )
                }
            };

            if !executions.finish(&worker_id, status) {
                info!(
                    execution_id = %worker_id,
                    ?status,
                    "execution already terminal; keeping earlier status"
                );
            }

            deliver(
                on_complete,
                Completion {
                    execution_id: worker_id.clone(),
                    success: result.success,
                    output: result.output,
                },
            );

            executions.schedule_removal(&worker_id);
        });

        execution_id
    }

    /// Best-effort cancel of a background run; see
    /// [`ExecutionRegistry::mark_cancelled`].
    pub fn cancel(&self, execution_id: &ExecutionId) -> bool {
        self.executions.mark_cancelled(execution_id)
    }
}

/// The shared run path: presence check, argv, launch, result formatting.
async fn execute(
    descriptor: &Descriptor,
    inputs: &InputValues,
    backend: &dyn ProcessBackend,
    config: &ExecutionConfig,
) -> RunOutput {
    let missing = missing_required(descriptor, inputs);
    if !missing.is_empty() {
        let lines: Vec<String> = missing.iter().map(ToString::to_string).collect();
        return RunOutput::failure(lines.join("\n"));
    }

    let argv = build_arguments(descriptor, inputs);
    let request = launch_request(
        descriptor,
        argv,
        config.interpreter.as_deref(),
        config.timeout,
    );

    info!(
        automation = %descriptor.id,
        program = %request.program,
        args = ?request.args,
        "running automation"
    );

    match backend.launch(request).await {
        Ok(ProcessOutcome::Exited {
            code,
            stdout,
            stderr,
        }) => {
            let success = code == Some(0);
            if success {
                info!(automation = %descriptor.id, "automation finished successfully");
            } else {
                warn!(automation = %descriptor.id, exit_code = ?code, "automation failed");
            }
            RunOutput {
                success,
                output: combine_output(&stdout, &stderr),
            }
        }
        Ok(ProcessOutcome::TimedOut) => {
            warn!(automation = %descriptor.id, timeout = ?config.timeout, "automation timed out");
            RunOutput::failure(format!(
                "Timeout: the automation timed out after {} seconds",
                config.timeout.as_secs_f64()
            ))
        }
        Err(err) => {
            error!(automation = %descriptor.id, error = %err, "automation could not be run");
            RunOutput::failure(format!("Unexpected error: {err}"))
        }
    }
}

fn not_found(id: &str) -> RunOutput {
    RunOutput::failure(format!("automation not found: {id}"))
}

/// Invoke a completion callback, containing a panic inside it.
fn deliver<F>(on_complete: F, completion: Completion)
where
    F: FnOnce(Completion),
{
    let execution_id = completion.execution_id.clone();
    if panic::catch_unwind(AssertUnwindSafe(move || on_complete(completion))).is_err() {
        error!(execution_id = %execution_id, "completion callback panicked");
    }
}
