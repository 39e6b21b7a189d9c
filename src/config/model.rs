// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from `automan.toml`.
///
/// ```toml
/// [automations]
/// root = "Automatizaciones"
/// manifest_file = "ui_config.json"
/// entry_file = "run.py"
/// interpreter = "python3"
///
/// [execution]
/// timeout = "300s"
/// cleanup_grace = "60s"
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated shape; use [`ConfigFile::try_from`] to obtain typed values.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub automations: AutomationsSection,

    #[serde(default)]
    pub execution: ExecutionSection,
}

/// `[automations]` section: where and how automations are discovered.
#[derive(Debug, Clone, Deserialize)]
pub struct AutomationsSection {
    /// Directory whose immediate subdirectories are automations.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Manifest file name expected inside each automation directory.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Entry file name expected inside each automation directory.
    #[serde(default = "default_entry_file")]
    pub entry_file: String,

    /// Program used to launch the entry file.
    ///
    /// An empty string means the entry file is executed directly.
    #[serde(default = "default_interpreter")]
    pub interpreter: Option<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from("Automatizaciones")
}

fn default_manifest_file() -> String {
    "ui_config.json".to_string()
}

fn default_entry_file() -> String {
    "run.py".to_string()
}

fn default_interpreter() -> Option<String> {
    Some("python3".to_string())
}

impl Default for AutomationsSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            manifest_file: default_manifest_file(),
            entry_file: default_entry_file(),
            interpreter: default_interpreter(),
        }
    }
}

/// `[execution]` section. Durations use `ms`, `s`, `m` or `h` suffixes.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionSection {
    /// Hard wall-clock limit for one run.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// How long a finished background execution stays visible.
    #[serde(default = "default_cleanup_grace")]
    pub cleanup_grace: String,
}

fn default_timeout() -> String {
    "300s".to_string()
}

fn default_cleanup_grace() -> String {
    "60s".to_string()
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            cleanup_grace: default_cleanup_grace(),
        }
    }
}

/// Validated configuration used by the rest of the crate.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub discovery: DiscoveryConfig,
    pub execution: ExecutionConfig,
}

/// Settings consumed by the [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub root: PathBuf,
    pub manifest_file: String,
    pub entry_file: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            manifest_file: default_manifest_file(),
            entry_file: default_entry_file(),
        }
    }
}

/// Settings consumed by the [`Executor`](crate::exec::Executor).
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub interpreter: Option<String>,
    pub timeout: Duration,
    pub cleanup_grace: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout: Duration::from_secs(300),
            cleanup_grace: Duration::from_secs(60),
        }
    }
}
