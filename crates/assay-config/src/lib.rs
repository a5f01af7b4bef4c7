//! Assay Configuration System
//!
//! Run-policy configuration for the assay test core:
//! - Stop policies (stop on error, failure, risky, incomplete, skipped)
//! - Strictness policies (tests without assertions, output, todo, resources)
//! - Per-size time limits
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Project config (`assay.toml`, found by walking up from a directory)
//! 3. Environment variables (`ASSAY_*`)
//!
//! # Example
//!
//! ```no_run
//! use assay_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("stop on failure: {}", config.run.stop.on_failure);
//! ```

pub mod loader;
pub mod run;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
pub use run::{RunConfig, StopConfig, StrictConfig, TimeLimitConfig};
