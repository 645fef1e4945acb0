//! Logging set-up
//!
//! Everything goes to stderr; stdout is reserved for command output.

use std::env;

use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LogLevel;

/// Set to `1` to force debug output regardless of configuration.
pub const VERBOSE_VARIABLE: &str = "ARCHETYPE_VERBOSE";

pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Information => LevelFilter::INFO,
        LogLevel::Warning => LevelFilter::WARN,
        LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        LogLevel::None => LevelFilter::OFF,
    }
}

/// Effective filter: `RUST_LOG` when set, else debug when verbose, else the
/// configured level.
pub fn build_filter(level: LogLevel, verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    let max = if verbose {
        LevelFilter::DEBUG
    } else {
        level_filter(level)
    };
    EnvFilter::builder()
        .with_default_directive(max.into())
        .parse_lossy("")
}

/// Whether `ARCHETYPE_VERBOSE` asks for debug output.
pub fn verbose_requested(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
}

/// Install the global subscriber. A subscriber installed earlier (tests,
/// embedding) is left in place.
pub fn init(level: LogLevel, verbose: bool) {
    let rust_log = env::var("RUST_LOG").ok();
    let filter = build_filter(level, verbose, rust_log.as_deref());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(filter);

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
        return;
    }
    if tracing_subscriber::registry().with(fmt_layer).try_init().is_ok() {
        debug!(level = %level, verbose, "logging initialised");
    }
}

/// Route panic payloads to the log instead of printing a crash dump.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        error!("panic: {info}");
    }));
}
