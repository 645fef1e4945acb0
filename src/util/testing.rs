//! Shared test helpers: one-time tracing set-up and throwaway settings
//! directories.

use std::env;
use std::path::Path;
use std::sync::Once;

use tempfile::TempDir;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::config::ConfigSources;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else if let Err(e) = subscriber.try_init() {
        eprintln!("Error: Failed to set up logging: {}", e);
    }
}

/// Temporary settings directory populated with `(file name, contents)`.
pub fn settings_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("create temp dir: {e}"));
    for (name, contents) in files {
        write_settings(dir.path(), name, contents);
    }
    dir
}

pub fn write_settings(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap_or_else(|e| panic!("write {name}: {e}"));
}

/// Sources over `dir` with exactly the given environment variables; the
/// process environment is ignored.
pub fn sources(dir: &Path, env: &[(&str, &str)]) -> ConfigSources {
    ConfigSources::new(dir, env.iter().copied())
}

/// Environment variables that influence a spawned binary, for clearing.
pub fn ambient_variables() -> Vec<String> {
    env::vars_os()
        .filter_map(|(k, _)| k.into_string().ok())
        .filter(|k| {
            let lower = k.to_ascii_lowercase();
            lower.starts_with("archetype_")
                || lower.starts_with("app_")
                || lower.starts_with("endpoints__")
                || matches!(
                    lower.replace(['_', '-'], "").as_str(),
                    "environment" | "httptimeoutseconds" | "loglevel"
                )
        })
        .collect()
}
