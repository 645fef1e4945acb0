//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Base file: `<config_dir>/appsettings.{json,toml}`
//! 3. Environment file: `<config_dir>/appsettings.<Environment>.{json,toml}`
//! 4. Process environment variables (`__` separates nested keys)
//!
//! Independent of layer order, values under the `App` section win over flat
//! top-level keys for the same field.

pub mod binding;
pub mod layers;
pub mod live;
pub mod resolver;
pub mod sources;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use binding::{bind_section, apply_rules, BindSection, Rule, Section};
pub use layers::{Layer, LayeredView, Node};
pub use live::LiveConfig;
pub use resolver::{
    AppConfig, ConfigResolver, LogLevel, Resolution, APP_SECTION, DEFAULT_HTTP_TIMEOUT_SECONDS,
    MAX_HTTP_TIMEOUT_SECONDS,
};
pub use sources::ConfigSources;

/// One rejected or repaired configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    /// Dotted field path, e.g. `App.HttpTimeoutSeconds`
    pub field: String,
    /// Offending raw value, when there was one
    pub value: Option<String>,
    pub reason: String,
}

impl ConfigViolation {
    pub fn new(field: impl Into<String>, value: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: {} (got '{}')", self.field, self.reason, value),
            None => write!(f, "{}: {}", self.field, self.reason),
        }
    }
}

/// Configuration errors.
///
/// Resolution of the application snapshot never surfaces these; they are
/// reported as violations instead. Strict section binding and the live view
/// return them.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("failed to read environment variables: {message}")]
    Environment { message: String },

    #[error("section '{section}' failed validation: {}", join_violations(.violations))]
    Validation {
        section: String,
        violations: Vec<ConfigViolation>,
    },

    #[error("failed to watch configuration directory: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
