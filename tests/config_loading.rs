// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;
use automan::config::{load_and_validate, load_or_default};
use automan::errors::AutomanError;

#[test]
fn full_config_is_applied() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[automations]
root = "/srv/automations"
manifest_file = "manifest.json"
entry_file = "main.sh"
interpreter = "bash"

[execution]
timeout = "90s"
cleanup_grace = "500ms"
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.discovery.root, PathBuf::from("/srv/automations"));
    assert_eq!(cfg.discovery.manifest_file, "manifest.json");
    assert_eq!(cfg.discovery.entry_file, "main.sh");
    assert_eq!(cfg.execution.interpreter.as_deref(), Some("bash"));
    assert_eq!(cfg.execution.timeout, Duration::from_secs(90));
    assert_eq!(cfg.execution.cleanup_grace, Duration::from_millis(500));
}

#[test]
fn partial_config_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[automations]
interpreter = ""
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.discovery.root, PathBuf::from("Automatizaciones"));
    assert!(cfg.execution.interpreter.is_none());
    assert_eq!(cfg.execution.timeout, Duration::from_secs(300));
}

#[test]
fn bad_duration_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[execution]
timeout = "five minutes"
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(AutomanError::ConfigError(msg)) => assert!(msg.contains("[execution].timeout")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[automations\nroot = 1").unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(AutomanError::TomlError(_))
    ));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let result = load_or_default(Some(std::path::Path::new("/no/such/automan.toml")));
    assert!(matches!(result, Err(AutomanError::IoError(_))));
}
