use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use automan::errors::{AutomanError, Result};
use automan::exec::{LaunchRequest, ProcessBackend, ProcessOutcome};

/// What the fake "process" does when launched.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    Exit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    TimeOut,
    SpawnError(String),
    Panic,
}

/// A fake backend that:
/// - records every launch request
/// - optionally waits on a gate before finishing
/// - then behaves as configured.
#[derive(Clone)]
pub struct FakeProcessBackend {
    behaviour: FakeBehaviour,
    gate: Option<Arc<Semaphore>>,
    launched: Arc<Mutex<Vec<LaunchRequest>>>,
}

impl FakeProcessBackend {
    pub fn new(behaviour: FakeBehaviour) -> Self {
        Self {
            behaviour,
            gate: None,
            launched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Exit 0 with the given stdout.
    pub fn succeeding(stdout: &str) -> Self {
        Self::new(FakeBehaviour::Exit {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    /// Non-zero exit with the given stderr.
    pub fn failing(code: i32, stderr: &str) -> Self {
        Self::new(FakeBehaviour::Exit {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }

    /// Every launch blocks until it can take one permit from the returned
    /// semaphore; release runs with `gate.add_permits(n)`.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn launched(&self) -> Vec<LaunchRequest> {
        self.launched.lock().unwrap().clone()
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn launch(
        &self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>> {
        self.launched.lock().unwrap().push(request.clone());
        let gate = self.gate.clone();
        let behaviour = self.behaviour.clone();

        Box::pin(async move {
            if let Some(gate) = gate {
                gate.acquire()
                    .await
                    .expect("fake backend gate closed")
                    .forget();
            }

            match behaviour {
                FakeBehaviour::Exit {
                    code,
                    stdout,
                    stderr,
                } => Ok(ProcessOutcome::Exited {
                    code,
                    stdout,
                    stderr,
                }),
                FakeBehaviour::TimeOut => Ok(ProcessOutcome::TimedOut),
                FakeBehaviour::SpawnError(msg) => Err(AutomanError::Spawn {
                    program: request.program,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, msg),
                }),
                FakeBehaviour::Panic => panic!("fake backend panic"),
            }
        })
    }
}
