// src/registry/manifest.rs

//! Manifest (`ui_config.json`) data model and parsing into [`Descriptor`]s.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{AutomanError, Result};

/// Description used when a manifest does not provide one.
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// Kind of filesystem path an input expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    File,
    Folder,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKind::File => f.write_str("file"),
            InputKind::Folder => f.write_str("folder"),
        }
    }
}

/// One declared parameter of an automation.
///
/// The position of an input inside [`Descriptor::inputs`] is the position of
/// its value on the entry file's command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputSpec {
    pub id: String,
    pub label: String,

    #[serde(rename = "type", default)]
    pub kind: InputKind,

    #[serde(default)]
    pub required: bool,

    /// File-dialog filter expression; never interpreted here.
    #[serde(default)]
    pub filters: Option<String>,
}

/// Manifest as written on disk.
#[derive(Debug, Clone, Deserialize)]
struct RawManifest {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    inputs: Vec<InputSpec>,
}

/// Parsed, immutable metadata of one automation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Name of the automation's directory.
    pub id: String,
    /// The automation's directory; runs use it as working directory.
    pub folder: PathBuf,
    pub entry_path: PathBuf,
    pub manifest_path: PathBuf,
    pub name: String,
    pub description: String,
    pub inputs: Vec<InputSpec>,
}

impl Descriptor {
    pub fn required_inputs(&self) -> impl Iterator<Item = &InputSpec> {
        self.inputs.iter().filter(|i| i.required)
    }
}

/// Parse manifest `contents` found in `folder`.
///
/// Missing `name`/`description` fall back to the directory name and
/// [`DEFAULT_DESCRIPTION`]. Empty or duplicate input ids and empty labels are
/// rejected, since they would make positional arguments ambiguous.
pub fn parse_manifest(
    folder: &Path,
    manifest_path: &Path,
    entry_path: &Path,
    contents: &str,
) -> Result<Descriptor> {
    let id = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| invalid(manifest_path, "automation folder has no name"))?;

    let raw: RawManifest = serde_json::from_str(contents)
        .map_err(|e| invalid(manifest_path, &e.to_string()))?;

    check_inputs(manifest_path, &raw.inputs)?;

    Ok(Descriptor {
        name: raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| id.clone()),
        description: raw
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        id,
        folder: folder.to_path_buf(),
        entry_path: entry_path.to_path_buf(),
        manifest_path: manifest_path.to_path_buf(),
        inputs: raw.inputs,
    })
}

fn check_inputs(manifest_path: &Path, inputs: &[InputSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for (idx, input) in inputs.iter().enumerate() {
        if input.id.trim().is_empty() {
            return Err(invalid(manifest_path, &format!("input #{idx} has an empty id")));
        }
        if input.label.trim().is_empty() {
            return Err(invalid(
                manifest_path,
                &format!("input '{}' has an empty label", input.id),
            ));
        }
        if !seen.insert(input.id.as_str()) {
            return Err(invalid(
                manifest_path,
                &format!("duplicate input id '{}'", input.id),
            ));
        }
    }
    Ok(())
}

fn invalid(path: &Path, reason: &str) -> AutomanError {
    AutomanError::InvalidManifest {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
