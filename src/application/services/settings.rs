//! Configuration inspection: `config show` and `config path`

use std::path::PathBuf;

use crate::application::ApplicationResult;
use crate::config::{AppConfig, ConfigSources};

/// Snapshot rendered as TOML.
pub fn render_config(config: &AppConfig) -> ApplicationResult<String> {
    Ok(toml::to_string(config)?)
}

/// Where configuration is read from for one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocations {
    pub dir: PathBuf,
    pub environment: String,
    /// Candidate settings files, lowest precedence first, with existence.
    pub files: Vec<(PathBuf, bool)>,
}

impl ConfigLocations {
    pub fn discover(sources: &ConfigSources) -> Self {
        let environment = sources.environment_name();
        let files = sources
            .base_files()
            .into_iter()
            .chain(sources.environment_files(&environment))
            .map(|(path, _)| {
                let exists = path.is_file();
                (path, exists)
            })
            .collect();
        Self {
            dir: sources.dir().to_path_buf(),
            environment,
            files,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Config directory: {}", self.dir.display()),
            format!("Environment: {}", self.environment),
        ];
        for (path, exists) in &self.files {
            let marker = if *exists { "found" } else { "missing" };
            lines.push(format!("  {} ({marker})", path.display()));
        }
        lines.join("\n")
    }
}
