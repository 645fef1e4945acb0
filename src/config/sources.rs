//! Where configuration comes from: a directory of settings files and a
//! snapshot of environment variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::FileFormat;

/// Environment variables naming the active environment, first non-empty wins.
pub const ENVIRONMENT_VARIABLES: [&str; 2] = ["ARCHETYPE_ENVIRONMENT", "APP_ENVIRONMENT"];

/// Overrides the directory settings files are read from.
pub const CONFIG_DIR_VARIABLE: &str = "ARCHETYPE_CONFIG_DIR";

/// Environment name used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "Production";

/// File stem shared by the base and the environment-qualified file.
pub const SETTINGS_STEM: &str = "appsettings";

/// Recognised settings formats in ascending precedence within one layer.
pub const SETTINGS_FORMATS: [(&str, FileFormat); 2] =
    [("json", FileFormat::Json), ("toml", FileFormat::Toml)];

/// Inputs to configuration resolution.
///
/// The environment is captured once so that resolving twice from the same
/// sources yields identical snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSources {
    dir: PathBuf,
    env: BTreeMap<String, String>,
}

impl ConfigSources {
    /// Sources for an explicit directory and environment (tests, embedding).
    pub fn new<I, K, V>(dir: impl Into<PathBuf>, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            dir: dir.into(),
            env: env.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Sources for the running process.
    ///
    /// Directory: `ARCHETYPE_CONFIG_DIR`, else the executable's directory,
    /// else the current directory. Non-UTF-8 variables are skipped.
    pub fn from_process() -> Self {
        let env: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();

        let dir = env
            .get(CONFIG_DIR_VARIABLE)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|exe| exe.parent().map(Path::to_path_buf))
            })
            .unwrap_or_else(|| PathBuf::from("."));

        Self { dir, env }
    }

    /// Directory holding the settings files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Captured environment variables.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Active environment name: first non-empty candidate variable, else
    /// `Production`.
    pub fn environment_name(&self) -> String {
        ENVIRONMENT_VARIABLES
            .iter()
            .filter_map(|name| self.env.get(*name))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ENVIRONMENT)
            .to_string()
    }

    /// Candidate base files, lowest precedence first.
    pub fn base_files(&self) -> Vec<(PathBuf, FileFormat)> {
        self.settings_files(SETTINGS_STEM)
    }

    /// Candidate environment-qualified files, lowest precedence first.
    pub fn environment_files(&self, environment: &str) -> Vec<(PathBuf, FileFormat)> {
        self.settings_files(&format!("{SETTINGS_STEM}.{environment}"))
    }

    fn settings_files(&self, stem: &str) -> Vec<(PathBuf, FileFormat)> {
        SETTINGS_FORMATS
            .iter()
            .map(|(ext, format)| (self.dir.join(format!("{stem}.{ext}")), *format))
            .collect()
    }
}
