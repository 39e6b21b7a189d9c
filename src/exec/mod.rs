// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for running an automation's entry file with
//! the caller's inputs and turning whatever happens into a result value.
//!
//! - [`validate`] checks caller inputs against the declared input specs.
//! - [`command`] builds the positional argument vector and formats output.
//! - [`backend`] provides the `ProcessBackend` trait and the concrete
//!   `RealProcessBackend` built on `tokio::process`, which tests can replace
//!   with a fake implementation.
//! - [`runner`] owns the [`Executor`]: blocking runs, background runs and
//!   their completion callbacks.

pub mod backend;
pub mod command;
pub mod runner;
pub mod validate;

pub use backend::{LaunchRequest, ProcessBackend, ProcessOutcome, RealProcessBackend};
pub use command::{build_arguments, combine_output, ERRORS_HEADER};
pub use runner::Executor;
pub use validate::{validate_inputs, Violation};
