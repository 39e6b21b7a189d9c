// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{
    AutomationsSection, ConfigFile, DiscoveryConfig, ExecutionConfig, ExecutionSection,
    RawConfigFile,
};
use crate::errors::{AutomanError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AutomanError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let interpreter = normalise_interpreter(raw.automations.interpreter.clone());
        Ok(ConfigFile {
            discovery: validate_automations(raw.automations)?,
            execution: validate_execution(raw.execution, interpreter)?,
        })
    }
}

fn validate_automations(section: AutomationsSection) -> Result<DiscoveryConfig> {
    ensure_file_name("manifest_file", &section.manifest_file)?;
    ensure_file_name("entry_file", &section.entry_file)?;

    if section.manifest_file == section.entry_file {
        return Err(AutomanError::ConfigError(format!(
            "[automations].manifest_file and entry_file must differ (both are '{}')",
            section.entry_file
        )));
    }

    Ok(DiscoveryConfig {
        root: section.root,
        manifest_file: section.manifest_file,
        entry_file: section.entry_file,
    })
}

fn ensure_file_name(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AutomanError::ConfigError(format!(
            "[automations].{key} must not be empty"
        )));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(AutomanError::ConfigError(format!(
            "[automations].{key} must be a bare file name (got '{value}')"
        )));
    }
    Ok(())
}

fn validate_execution(
    section: ExecutionSection,
    interpreter: Option<String>,
) -> Result<ExecutionConfig> {
    let timeout = parse_duration(&section.timeout)
        .map_err(|e| AutomanError::ConfigError(format!("[execution].timeout: {e}")))?;
    if timeout.is_zero() {
        return Err(AutomanError::ConfigError(
            "[execution].timeout must be greater than zero".to_string(),
        ));
    }

    let cleanup_grace = parse_duration(&section.cleanup_grace)
        .map_err(|e| AutomanError::ConfigError(format!("[execution].cleanup_grace: {e}")))?;

    Ok(ExecutionConfig {
        interpreter,
        timeout,
        cleanup_grace,
    })
}

fn normalise_interpreter(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse duration strings like `"500ms"`, `"3s"`, `"5m"`, `"1h"`.
///
/// Values too large to represent as seconds are rejected rather than wrapped.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit (ms, s, m or h)"))?;
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration number '{digits}': {e}"))?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => {
            return Err(format!(
                "unsupported duration unit '{other}'; expected ms, s, m, or h"
            ));
        }
    };

    value
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.discovery.manifest_file, "ui_config.json");
        assert_eq!(cfg.discovery.entry_file, "run.py");
        assert_eq!(cfg.execution.interpreter.as_deref(), Some("python3"));
        assert_eq!(cfg.execution.timeout, Duration::from_secs(300));
        assert_eq!(cfg.execution.cleanup_grace, Duration::from_secs(60));
    }

    #[test]
    fn empty_interpreter_means_direct_execution() {
        let mut raw = RawConfigFile::default();
        raw.automations.interpreter = Some("  ".to_string());
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert!(cfg.execution.interpreter.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.execution.timeout = "0s".to_string();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(AutomanError::ConfigError(msg)) if msg.contains("timeout")
        ));
    }

    #[test]
    fn entry_file_must_be_a_bare_name() {
        let mut raw = RawConfigFile::default();
        raw.automations.entry_file = "bin/run.py".to_string();
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("3d").is_err());
    }

    #[test]
    fn oversized_duration_is_an_error() {
        let err = parse_duration("9999999999999999999m").unwrap_err();
        assert!(err.contains("out of range"), "{err}");
        assert!(parse_duration("9999999999999999999h").is_err());
        assert_eq!(
            parse_duration("9999999999999999999s"),
            Ok(Duration::from_secs(9_999_999_999_999_999_999))
        );
    }

    #[test]
    fn oversized_grace_is_a_config_error() {
        let mut raw = RawConfigFile::default();
        raw.execution.cleanup_grace = "99999999999999999999h".to_string();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(AutomanError::ConfigError(msg)) if msg.contains("cleanup_grace")
        ));

        let mut raw = RawConfigFile::default();
        raw.execution.timeout = "9999999999999999999h".to_string();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(AutomanError::ConfigError(msg)) if msg.contains("out of range")
        ));
    }
}
