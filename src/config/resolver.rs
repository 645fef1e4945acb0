//! Materialise the typed application snapshot from the layered view.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use super::binding::{apply_rules, BindSection, Rule, Section};
use super::layers::LayeredView;
use super::sources::{ConfigSources, DEFAULT_ENVIRONMENT};
use super::ConfigViolation;

/// Section whose values override flat keys of the same field.
pub const APP_SECTION: &str = "App";

pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Upper bound of the general validity range `1..=300`.
pub const MAX_HTTP_TIMEOUT_SECONDS: u64 = 300;

/// Log verbosity accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Information,
    Warning,
    Error,
    Critical,
    None,
}

impl LogLevel {
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Information,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
        LogLevel::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Critical => "Critical",
            LogLevel::None => "None",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Case-insensitive match against the fixed set of names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

/// Typed application configuration. Every field is valid once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppConfig {
    pub environment: String,
    /// Always within `1..=300`.
    pub http_timeout_seconds: u64,
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
            log_level: LogLevel::Information,
        }
    }
}

/// Raw values as bound, before defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawAppConfig {
    environment: String,
    http_timeout_seconds: i64,
    log_level: String,
}

impl Default for RawAppConfig {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            environment: defaults.environment,
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS as i64,
            log_level: defaults.log_level.to_string(),
        }
    }
}

impl BindSection for RawAppConfig {
    fn bind(&mut self, section: &Section<'_>, violations: &mut Vec<ConfigViolation>) {
        section.bind_string("Environment", &mut self.environment);
        section.bind_parsed("HttpTimeoutSeconds", &mut self.http_timeout_seconds, violations);
        section.bind_string("LogLevel", &mut self.log_level);
    }
}

fn environment_not_blank(raw: &mut RawAppConfig) -> Option<ConfigViolation> {
    if !raw.environment.trim().is_empty() {
        return None;
    }
    raw.environment = DEFAULT_ENVIRONMENT.to_string();
    Some(ConfigViolation::new(
        "Environment",
        None,
        format!("blank, using '{DEFAULT_ENVIRONMENT}'"),
    ))
}

fn timeout_in_range(raw: &mut RawAppConfig) -> Option<ConfigViolation> {
    let value = raw.http_timeout_seconds;
    if value > 0 && value <= MAX_HTTP_TIMEOUT_SECONDS as i64 {
        return None;
    }
    raw.http_timeout_seconds = DEFAULT_HTTP_TIMEOUT_SECONDS as i64;
    Some(ConfigViolation::new(
        "HttpTimeoutSeconds",
        Some(value.to_string()),
        format!("outside 1..={MAX_HTTP_TIMEOUT_SECONDS}, using {DEFAULT_HTTP_TIMEOUT_SECONDS}"),
    ))
}

fn log_level_known(raw: &mut RawAppConfig) -> Option<ConfigViolation> {
    let original = raw.log_level.clone();
    let reason = if original.trim().is_empty() {
        "blank"
    } else if let Ok(level) = original.parse::<LogLevel>() {
        raw.log_level = level.to_string();
        return None;
    } else {
        "unknown level"
    };
    raw.log_level = LogLevel::Information.to_string();
    Some(ConfigViolation::new(
        "LogLevel",
        (!original.is_empty()).then_some(original),
        format!("{reason}, using 'Information'"),
    ))
}

/// Defaulting rules, evaluated in order after both binding passes.
const APP_RULES: [Rule<RawAppConfig>; 3] = [environment_not_blank, timeout_in_range, log_level_known];

/// Apply the general validity cap: values outside `1..=300` reset to 30.
pub fn normalize_timeout(value: i64) -> u64 {
    if value > 0 && value <= MAX_HTTP_TIMEOUT_SECONDS as i64 {
        value as u64
    } else {
        DEFAULT_HTTP_TIMEOUT_SECONDS
    }
}

/// Outcome of a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub config: AppConfig,
    /// Environment name used to pick the environment-qualified file.
    pub environment_name: String,
    /// Layers that contributed, lowest precedence first.
    pub layers: Vec<String>,
    /// Everything that was ignored, rejected or defaulted.
    pub violations: Vec<ConfigViolation>,
    /// Merged view the snapshot was bound from, for binding further sections.
    pub view: LayeredView,
}

/// Resolves [`AppConfig`] from a set of sources. Never fails.
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver<'a> {
    sources: &'a ConfigSources,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(sources: &'a ConfigSources) -> Self {
        Self { sources }
    }

    /// Fully defaulted, valid snapshot.
    pub fn resolve(&self) -> AppConfig {
        self.resolve_with_report().config
    }

    /// Snapshot plus the diagnostics gathered while producing it.
    pub fn resolve_with_report(&self) -> Resolution {
        let environment_name = self.sources.environment_name();
        let (view, mut violations) = LayeredView::build(self.sources, &environment_name);
        let (config, bind_violations) = materialize(&view);
        violations.extend(bind_violations);

        debug!(
            environment = %environment_name,
            layers = ?view.applied(),
            violations = violations.len(),
            "configuration resolved"
        );

        Resolution {
            config,
            environment_name,
            layers: view.applied().to_vec(),
            violations,
            view,
        }
    }
}

/// Two-pass bind (flat keys, then the `App` section) followed by the
/// defaulting rules.
pub fn materialize(view: &LayeredView) -> (AppConfig, Vec<ConfigViolation>) {
    let mut raw = RawAppConfig::default();
    let mut violations = Vec::new();
    raw.bind(&view.root(), &mut violations);
    raw.bind(&view.section(APP_SECTION), &mut violations);
    violations.extend(apply_rules(&mut raw, &APP_RULES));

    let config = AppConfig {
        environment: raw.environment,
        http_timeout_seconds: normalize_timeout(raw.http_timeout_seconds),
        log_level: raw.log_level.parse().unwrap_or_default(),
    };
    (config, violations)
}
