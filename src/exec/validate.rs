// src/exec/validate.rs

//! Input validation against a descriptor's declared inputs.

use thiserror::Error;

use crate::fs::FileSystem;
use crate::registry::{Descriptor, InputKind, InputSpec};
use crate::types::InputValues;

/// One problem with a caller-supplied input.
///
/// The `Display` text is meant to be shown next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("missing required field: {label}")]
    MissingRequired { input: String, label: String },

    #[error("path does not exist: {path}")]
    PathNotFound { input: String, path: String },

    #[error("expected a file but found a folder: {path}")]
    ExpectedFile { input: String, path: String },

    #[error("expected a folder but found a file: {path}")]
    ExpectedFolder { input: String, path: String },
}

impl Violation {
    /// Id of the input this violation belongs to.
    pub fn input(&self) -> &str {
        match self {
            Violation::MissingRequired { input, .. }
            | Violation::PathNotFound { input, .. }
            | Violation::ExpectedFile { input, .. }
            | Violation::ExpectedFolder { input, .. } => input,
        }
    }
}

/// Value supplied for `spec`, treating an empty string as absent.
pub fn supplied_value<'a>(spec: &InputSpec, inputs: &'a InputValues) -> Option<&'a str> {
    inputs
        .get(&spec.id)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Check every declared input and return all violations, in input order.
pub fn validate_inputs(
    fs: &dyn FileSystem,
    descriptor: &Descriptor,
    inputs: &InputValues,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for spec in &descriptor.inputs {
        let Some(value) = supplied_value(spec, inputs) else {
            if spec.required {
                violations.push(missing(spec));
            }
            continue;
        };

        let path = std::path::Path::new(value);
        if !fs.exists(path) {
            violations.push(Violation::PathNotFound {
                input: spec.id.clone(),
                path: value.to_string(),
            });
            continue;
        }

        match spec.kind {
            InputKind::File if !fs.is_file(path) => violations.push(Violation::ExpectedFile {
                input: spec.id.clone(),
                path: value.to_string(),
            }),
            InputKind::Folder if !fs.is_dir(path) => violations.push(Violation::ExpectedFolder {
                input: spec.id.clone(),
                path: value.to_string(),
            }),
            _ => {}
        }
    }

    violations
}

/// Only the presence check; used right before launching a run.
pub fn missing_required(descriptor: &Descriptor, inputs: &InputValues) -> Vec<Violation> {
    descriptor
        .required_inputs()
        .filter(|spec| supplied_value(spec, inputs).is_none())
        .map(missing)
        .collect()
}

fn missing(spec: &InputSpec) -> Violation {
    Violation::MissingRequired {
        input: spec.id.clone(),
        label: spec.label.clone(),
    }
}
