//! Live configuration view
//!
//! Watches the settings directory and re-resolves on change. Reads may see a
//! newer value than the frozen startup snapshot; consumers choose which one
//! they want. Environment variables are captured once and never re-read.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use super::resolver::{AppConfig, ConfigResolver};
use super::sources::{ConfigSources, SETTINGS_STEM};
use super::ConfigResult;

struct LiveState {
    sources: ConfigSources,
    current: RwLock<AppConfig>,
    generation: AtomicU64,
}

impl LiveState {
    fn reload(&self) {
        let resolution = ConfigResolver::new(&self.sources).resolve_with_report();
        for violation in &resolution.violations {
            warn!("configuration: {violation}");
        }
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if *current != resolution.config {
            info!(
                timeout = resolution.config.http_timeout_seconds,
                level = %resolution.config.log_level,
                "configuration reloaded"
            );
        }
        *current = resolution.config;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Continuously refreshed [`AppConfig`].
pub struct LiveConfig {
    state: Arc<LiveState>,
    _watcher: RecommendedWatcher,
}

impl LiveConfig {
    /// Resolve once, then start watching the settings directory.
    pub fn watch(sources: ConfigSources) -> ConfigResult<Self> {
        let initial = ConfigResolver::new(&sources).resolve();
        let state = Arc::new(LiveState {
            sources,
            current: RwLock::new(initial),
            generation: AtomicU64::new(0),
        });

        let handler_state = Arc::clone(&state);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches_settings(&event) => {
                debug!(kind = ?event.kind, paths = ?event.paths, "settings changed");
                handler_state.reload();
            }
            Ok(_) => {}
            Err(e) => warn!("configuration watch error: {e}"),
        })?;
        watcher.watch(state.sources.dir(), RecursiveMode::NonRecursive)?;
        debug!(dir = %state.sources.dir().display(), "watching configuration");

        Ok(Self {
            state,
            _watcher: watcher,
        })
    }

    /// Latest resolved snapshot.
    pub fn current(&self) -> AppConfig {
        self.state
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of reloads since the view was created.
    pub fn generation(&self) -> u64 {
        self.state.generation.load(Ordering::SeqCst)
    }

    /// Force a re-resolution without waiting for a file event.
    pub fn reload(&self) {
        self.state.reload();
    }
}

fn touches_settings(event: &Event) -> bool {
    let relevant = event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove();
    relevant && event.paths.iter().any(|p| is_settings_file(p))
}

fn is_settings_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(SETTINGS_STEM))
}
