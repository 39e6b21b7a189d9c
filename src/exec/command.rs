// src/exec/command.rs

//! Command-line construction and output formatting for automation runs.

use std::time::Duration;

use crate::registry::Descriptor;
use crate::types::InputValues;

use super::backend::LaunchRequest;

/// Header placed between stdout and stderr in the combined output.
pub const ERRORS_HEADER: &str = "--- ERRORS ---";

/// Positional argument vector: `[entry_path, value_1, value_2, ...]`.
///
/// Values follow the descriptor's declared input order. Inputs missing from
/// `inputs` become empty strings so positions never shift.
pub fn build_arguments(descriptor: &Descriptor, inputs: &InputValues) -> Vec<String> {
    let mut argv = Vec::with_capacity(descriptor.inputs.len() + 1);
    argv.push(descriptor.entry_path.to_string_lossy().into_owned());
    argv.extend(
        descriptor
            .inputs
            .iter()
            .map(|spec| inputs.get(&spec.id).cloned().unwrap_or_default()),
    );
    argv
}

/// Turn an argument vector into a launch request.
///
/// With an interpreter the whole vector becomes its arguments; without one
/// the entry file itself is the program.
pub fn launch_request(
    descriptor: &Descriptor,
    argv: Vec<String>,
    interpreter: Option<&str>,
    timeout: Duration,
) -> LaunchRequest {
    let (program, args) = match interpreter {
        Some(interpreter) => (interpreter.to_string(), argv),
        None => {
            let mut argv = argv.into_iter();
            let program = argv.next().unwrap_or_default();
            (program, argv.collect())
        }
    };

    LaunchRequest {
        program,
        args,
        working_dir: descriptor.folder.clone(),
        timeout,
    }
}

/// Stdout followed by an errors section when stderr is non-empty.
pub fn combine_output(stdout: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        return stdout.to_string();
    }
    format!("{stdout}\n{ERRORS_HEADER}\n{stderr}")
}
