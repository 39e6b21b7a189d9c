// src/registry/mod.rs

//! Automation discovery.
//!
//! An automation is a directory directly below the configured root that
//! contains both a manifest file and an entry file. The [`Registry`] keeps
//! the parsed [`Descriptor`]s of the last scan and swaps the whole set on
//! every (re)scan, so readers always observe either the old or the new set.

pub mod manifest;

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::fs::FileSystem;

pub use manifest::{parse_manifest, Descriptor, InputKind, InputSpec, DEFAULT_DESCRIPTION};

/// Immutable view of the descriptors produced by one scan.
pub type Snapshot = Arc<Vec<Arc<Descriptor>>>;

pub struct Registry {
    config: DiscoveryConfig,
    fs: Arc<dyn FileSystem>,
    descriptors: RwLock<Snapshot>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("root", &self.config.root)
            .field("automations", &self.list().len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Create a registry and perform the initial scan of `config.root`.
    pub fn load(config: DiscoveryConfig, fs: Arc<dyn FileSystem>) -> Self {
        let registry = Self {
            config,
            fs,
            descriptors: RwLock::new(Arc::new(Vec::new())),
        };
        registry.reload();
        registry
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Scan `root` and replace the current set with the result.
    ///
    /// Never fails: a missing root yields an empty set and a malformed
    /// automation is skipped with a warning.
    pub fn scan(&self, root: &Path) -> Snapshot {
        let found: Snapshot = Arc::new(
            discover(self.fs.as_ref(), &self.config, root)
                .into_iter()
                .map(Arc::new)
                .collect(),
        );

        info!(
            root = ?root,
            count = found.len(),
            "automation scan complete"
        );

        let mut guard = self
            .descriptors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::clone(&found);
        found
    }

    /// Re-scan the configured root.
    pub fn reload(&self) -> Snapshot {
        debug!(root = ?self.config.root, "reloading automations");
        self.scan(&self.config.root)
    }

    /// Descriptors from the last scan, in discovery order.
    pub fn list(&self) -> Snapshot {
        let guard = self
            .descriptors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Descriptor>> {
        self.list().iter().find(|d| d.id == id).cloned()
    }
}

/// Walk the immediate subdirectories of `root` and parse every automation.
///
/// Results are ordered by directory path.
pub fn discover(fs: &dyn FileSystem, config: &DiscoveryConfig, root: &Path) -> Vec<Descriptor> {
    if !fs.is_dir(root) {
        warn!(root = ?root, "automations folder not found");
        return Vec::new();
    }

    let mut entries = match fs.read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(root = ?root, error = %err, "failed to read automations folder");
            return Vec::new();
        }
    };
    entries.sort();

    let mut descriptors = Vec::new();
    for folder in entries {
        if !fs.is_dir(&folder) {
            continue;
        }

        let manifest_path = folder.join(&config.manifest_file);
        let entry_path = folder.join(&config.entry_file);
        if !fs.is_file(&manifest_path) || !fs.is_file(&entry_path) {
            debug!(folder = ?folder, "skipping directory without manifest and entry file");
            continue;
        }

        let parsed = fs
            .read_to_string(&manifest_path)
            .map_err(crate::errors::AutomanError::from)
            .and_then(|contents| parse_manifest(&folder, &manifest_path, &entry_path, &contents));

        match parsed {
            Ok(descriptor) => {
                info!(
                    automation = %descriptor.id,
                    name = %descriptor.name,
                    inputs = descriptor.inputs.len(),
                    "automation loaded"
                );
                descriptors.push(descriptor);
            }
            Err(err) => {
                warn!(folder = ?folder, error = %err, "skipping automation with invalid manifest");
            }
        }
    }

    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::path::PathBuf;

    fn config() -> DiscoveryConfig {
        DiscoveryConfig {
            root: PathBuf::from("/autos"),
            ..DiscoveryConfig::default()
        }
    }

    fn add_automation(fs: &MockFileSystem, id: &str, manifest: &str) {
        fs.add_file(format!("/autos/{id}/ui_config.json"), manifest);
        fs.add_file(format!("/autos/{id}/run.py"), "print('hi')");
    }

    #[test]
    fn directory_without_entry_file_is_skipped() {
        let fs = MockFileSystem::new();
        add_automation(&fs, "A", r#"{"name": "Alpha"}"#);
        fs.add_file("/autos/B/ui_config.json", "{}");

        let registry = Registry::load(config(), Arc::new(fs));
        let ids: Vec<_> = registry.list().iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, ["A"]);
        assert_eq!(registry.get("A").unwrap().name, "Alpha");
        assert!(registry.get("B").is_none());
    }

    #[test]
    fn malformed_manifest_does_not_abort_the_scan() {
        let fs = MockFileSystem::new();
        add_automation(&fs, "broken", "{ not json");
        add_automation(&fs, "good", "{}");

        let registry = Registry::load(config(), Arc::new(fs));
        assert_eq!(registry.list().len(), 1);
        assert!(registry.get("good").is_some());
    }

    #[test]
    fn missing_root_yields_an_empty_set() {
        let registry = Registry::load(config(), Arc::new(MockFileSystem::new()));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn loose_files_in_root_are_ignored() {
        let fs = MockFileSystem::new();
        fs.add_file("/autos/README.md", "docs");
        add_automation(&fs, "only", "{}");

        let registry = Registry::load(config(), Arc::new(fs));
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn reload_reflects_additions_and_removals() {
        let fs = MockFileSystem::new();
        add_automation(&fs, "first", "{}");
        let registry = Registry::load(config(), Arc::new(fs.clone()));

        let before = registry.list();
        fs.remove("/autos/first/ui_config.json");
        add_automation(&fs, "second", "{}");
        registry.reload();

        assert!(registry.get("first").is_none());
        assert!(registry.get("second").is_some());
        // Snapshots taken before a reload are unaffected.
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].id, "first");
    }
}
