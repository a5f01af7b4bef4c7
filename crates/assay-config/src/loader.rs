//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::run::RunConfig;
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "assay.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Project config (./assay.toml) - overrides defaults
/// 3. Environment variables (ASSAY_*) - overrides project
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides (used by embedders that pass flags explicitly)
    ignore_env: bool,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Run policy configuration
    pub run: RunConfig,

    /// Directory where assay.toml was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Do not consult `ASSAY_*` environment variables
    pub fn without_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find assay.toml. A missing file is not
    /// an error: defaults are used instead.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, run) = self.find_project_config(start_dir)?;
        let run = self.finish(run)?;

        Ok(Config { run, project_root })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let run = RunConfig::load_from_file(config_path)?;
        let run = self.finish(run)?;

        Ok(Config {
            run,
            project_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    fn finish(&self, run: RunConfig) -> ConfigResult<RunConfig> {
        if self.ignore_env {
            return Ok(run);
        }
        let run = apply_overrides(run, |key| env::var(key).ok())?;
        run.validate()?;
        Ok(run)
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, RunConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "loading run configuration");
                let run = RunConfig::load_from_file(&config_path)?;
                return Ok((Some(current), run));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, RunConfig::default())),
            }
        }
    }
}

/// Apply `ASSAY_*` overrides using the given variable lookup
///
/// Boolean variables accept `true`, `1`, `yes` (anything else is false).
/// Numeric variables must parse as whole seconds.
pub fn apply_overrides<F>(mut config: RunConfig, lookup: F) -> ConfigResult<RunConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let flags: [(&str, &mut bool); 10] = [
        ("ASSAY_STOP_ON_ERROR", &mut config.stop.on_error),
        ("ASSAY_STOP_ON_FAILURE", &mut config.stop.on_failure),
        ("ASSAY_STOP_ON_RISKY", &mut config.stop.on_risky),
        ("ASSAY_STOP_ON_INCOMPLETE", &mut config.stop.on_incomplete),
        ("ASSAY_STOP_ON_SKIPPED", &mut config.stop.on_skipped),
        (
            "ASSAY_STRICT_ASSERTIONS",
            &mut config.strict.tests_without_assertions,
        ),
        ("ASSAY_STRICT_OUTPUT", &mut config.strict.output_during_tests),
        ("ASSAY_STRICT_TODO", &mut config.strict.todo_annotated_tests),
        (
            "ASSAY_STRICT_RESOURCES",
            &mut config.strict.resource_usage_during_small_tests,
        ),
        ("ASSAY_ENFORCE_TIME_LIMIT", &mut config.time_limit.enforce),
    ];

    for (key, slot) in flags {
        if let Some(raw) = lookup(key) {
            *slot = matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes");
        }
    }

    let limits: [(&str, &mut u64); 3] = [
        ("ASSAY_TIMEOUT_SMALL", &mut config.time_limit.small),
        ("ASSAY_TIMEOUT_MEDIUM", &mut config.time_limit.medium),
        ("ASSAY_TIMEOUT_LARGE", &mut config.time_limit.large),
    ];

    for (key, slot) in limits {
        if let Some(raw) = lookup(key) {
            *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: key.to_string(),
                reason: format!("expected whole seconds, got '{}'", raw),
            })?;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_set_flags() {
        let config = apply_overrides(
            RunConfig::default(),
            lookup_from(&[("ASSAY_STOP_ON_FAILURE", "yes"), ("ASSAY_STRICT_OUTPUT", "1")]),
        )
        .unwrap();
        assert!(config.stop.on_failure);
        assert!(config.strict.output_during_tests);
        assert!(!config.stop.on_error);
    }

    #[test]
    fn test_overrides_can_clear_flags() {
        let mut base = RunConfig::default();
        base.stop.on_error = true;
        let config = apply_overrides(base, lookup_from(&[("ASSAY_STOP_ON_ERROR", "false")])).unwrap();
        assert!(!config.stop.on_error);
    }

    #[test]
    fn test_timeout_override() {
        let config = apply_overrides(
            RunConfig::default(),
            lookup_from(&[("ASSAY_TIMEOUT_LARGE", "120")]),
        )
        .unwrap();
        assert_eq!(config.time_limit.large, 120);
    }

    #[test]
    fn test_bad_timeout_override() {
        let err = apply_overrides(
            RunConfig::default(),
            lookup_from(&[("ASSAY_TIMEOUT_SMALL", "soon")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ASSAY_TIMEOUT_SMALL"));
    }
}
