#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use automan::config::{DiscoveryConfig, ExecutionConfig};
use automan::exec::{Executor, ProcessBackend};
use automan::fs::mock::MockFileSystem;
use automan::fs::FileSystem;
use automan::registry::Registry;
use automan::types::InputValues;
use automan_test_utils::builders::AutomationBuilder;

pub const ROOT: &str = "/autos";

/// Discovery settings for the mock tree below [`ROOT`].
pub fn mock_discovery() -> DiscoveryConfig {
    DiscoveryConfig {
        root: ROOT.into(),
        ..DiscoveryConfig::default()
    }
}

pub fn execution_config() -> ExecutionConfig {
    ExecutionConfig {
        interpreter: Some("python3".to_string()),
        timeout: Duration::from_secs(300),
        cleanup_grace: Duration::from_secs(60),
    }
}

/// "organizer": required `src` folder, optional `cfg` file.
pub fn organizer() -> AutomationBuilder {
    AutomationBuilder::new("organizer")
        .name("File organizer")
        .input("src", "Source folder", "folder", true)
        .input("cfg", "Config file", "file", false)
}

/// Executor over `fs` with the mock automations root. Call inside a runtime.
pub fn mock_executor(
    fs: &MockFileSystem,
    backend: Arc<dyn ProcessBackend>,
    config: ExecutionConfig,
) -> Executor {
    let fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let registry = Arc::new(Registry::load(mock_discovery(), Arc::clone(&fs)));
    Executor::new(registry, fs, backend, config, Handle::current())
}

pub fn install(fs: &MockFileSystem, automation: &AutomationBuilder) {
    automation.install_mock(fs, Path::new(ROOT), "run.py");
}

pub fn values(pairs: &[(&str, &str)]) -> InputValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
