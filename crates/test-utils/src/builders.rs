#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use automan::fs::mock::MockFileSystem;

/// Builder for one automation directory (manifest + entry file).
pub struct AutomationBuilder {
    id: String,
    name: Option<String>,
    description: Option<String>,
    inputs: Vec<Value>,
    script: String,
}

impl AutomationBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            description: None,
            inputs: Vec::new(),
            script: "#!/bin/sh\nexit 0\n".to_string(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Declare an input; `kind` is `"file"` or `"folder"`.
    pub fn input(mut self, id: &str, label: &str, kind: &str, required: bool) -> Self {
        self.inputs.push(json!({
            "id": id,
            "label": label,
            "type": kind,
            "required": required,
        }));
        self
    }

    /// Body of the entry file.
    pub fn script(mut self, script: &str) -> Self {
        self.script = script.to_string();
        self
    }

    pub fn manifest_json(&self) -> String {
        let mut manifest = json!({ "inputs": self.inputs });
        if let Some(name) = &self.name {
            manifest["name"] = json!(name);
        }
        if let Some(description) = &self.description {
            manifest["description"] = json!(description);
        }
        manifest.to_string()
    }

    /// Install into an in-memory filesystem below `root`.
    pub fn install_mock(&self, fs: &MockFileSystem, root: &Path, entry_file: &str) -> PathBuf {
        let dir = root.join(&self.id);
        fs.add_file(dir.join("ui_config.json"), self.manifest_json());
        fs.add_file(dir.join(entry_file), self.script.clone());
        dir
    }

    /// Write to disk below `root`.
    pub fn write_to(&self, root: &Path, entry_file: &str) -> PathBuf {
        let dir = root.join(&self.id);
        std::fs::create_dir_all(&dir).expect("create automation dir");
        std::fs::write(dir.join("ui_config.json"), self.manifest_json()).expect("write manifest");
        std::fs::write(dir.join(entry_file), &self.script).expect("write entry file");
        dir
    }
}
