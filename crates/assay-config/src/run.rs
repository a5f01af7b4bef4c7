//! Run Policy Configuration (`assay.toml`)
//!
//! Mirrors the policy flags held by a test result: when to stop a run early,
//! which strictness checks turn a passing test into a risky one, and the
//! time budget allotted to each test size.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level run configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Stop-on-X policies
    #[serde(default)]
    pub stop: StopConfig,

    /// Strictness policies
    #[serde(default)]
    pub strict: StrictConfig,

    /// Time limits per test size
    #[serde(default, rename = "time-limit")]
    pub time_limit: TimeLimitConfig,
}

/// Which outcomes request the run to stop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StopConfig {
    #[serde(default)]
    pub on_error: bool,
    #[serde(default)]
    pub on_failure: bool,
    #[serde(default)]
    pub on_risky: bool,
    #[serde(default)]
    pub on_incomplete: bool,
    #[serde(default)]
    pub on_skipped: bool,
}

/// Strictness checks applied after a test body completes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StrictConfig {
    /// Flag tests that perform no assertions as risky
    #[serde(default)]
    pub tests_without_assertions: bool,

    /// Flag tests that print output as risky
    #[serde(default)]
    pub output_during_tests: bool,

    /// Flag tests declared as todo as risky
    #[serde(default)]
    pub todo_annotated_tests: bool,

    /// Flag small tests that touch external resources as risky
    #[serde(default)]
    pub resource_usage_during_small_tests: bool,
}

/// Time budget per test size, in seconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TimeLimitConfig {
    /// Enforce the limits below
    #[serde(default)]
    pub enforce: bool,

    #[serde(default = "default_small")]
    pub small: u64,

    #[serde(default = "default_medium")]
    pub medium: u64,

    #[serde(default = "default_large")]
    pub large: u64,
}

fn default_small() -> u64 {
    1
}

fn default_medium() -> u64 {
    10
}

fn default_large() -> u64 {
    60
}

impl Default for TimeLimitConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            small: default_small(),
            medium: default_medium(),
            large: default_large(),
        }
    }
}

impl RunConfig {
    /// Load run configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Parse run configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Validate the run configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let limits = [
            ("time-limit.small", self.time_limit.small),
            ("time-limit.medium", self.time_limit.medium),
            ("time-limit.large", self.time_limit.large),
        ];

        for (field, seconds) in limits {
            if seconds == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "time limit must be at least one second".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert!(!config.stop.on_failure);
        assert!(!config.strict.tests_without_assertions);
        assert_eq!(config.time_limit.small, 1);
        assert_eq!(config.time_limit.medium, 10);
        assert_eq!(config.time_limit.large, 60);
    }

    #[test]
    fn test_parse_full() {
        let toml = r#"
[stop]
on-error = true
on-failure = true

[strict]
tests-without-assertions = true
output-during-tests = true

[time-limit]
enforce = true
small = 2
"#;
        let config = RunConfig::from_toml_str(toml).unwrap();
        assert!(config.stop.on_error);
        assert!(config.stop.on_failure);
        assert!(!config.stop.on_risky);
        assert!(config.strict.tests_without_assertions);
        assert!(config.strict.output_during_tests);
        assert!(config.time_limit.enforce);
        assert_eq!(config.time_limit.small, 2);
        assert_eq!(config.time_limit.medium, 10);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[stop]
on-warning = true
"#;
        assert!(RunConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_zero_time_limit_rejected() {
        let mut config = RunConfig::default();
        config.time_limit.medium = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("time-limit.medium"));
    }

    #[test]
    fn test_round_trip_preserves_policy() {
        let mut config = RunConfig::default();
        config.stop.on_skipped = true;
        config.strict.todo_annotated_tests = true;
        let text = config.to_toml_string().unwrap();
        assert_eq!(RunConfig::from_toml_str(&text).unwrap(), config);
    }
}
