//! Unified logging for the daemon.
//!
//! Provides compact timestamped console logging with per-module level
//! configuration, plus an optional daily rolling log file.
//! Supports `RUST_LOG` environment variable for runtime overrides.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "info"
//! file = true        # <state_dir>/indexer.log.YYYY-MM-DD
//!
//! [logging.modules]
//! "page_indexer::index" = "debug"
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug page-indexer
//! ```

use std::path::Path;
use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Base name of the rolling log file.
pub const LOG_FILE_NAME: &str = "indexer.log";

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Full date and time for log files, which outlive a single day.
struct FileTime;

impl FormatTime for FileTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%d %b %Y %H:%M:%S%.3f"))
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    // RUST_LOG env var takes precedence over config
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let mut filter_str = config.default.clone();
    for (module, level) in &config.modules {
        filter_str.push_str(&format!(",{module}={level}"));
    }
    EnvFilter::new(&filter_str)
}

/// Initialize logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes effect).
///
/// When `log_dir` is given, events are also written to a daily rolling
/// [`LOG_FILE_NAME`] there. The returned guard flushes that file on drop and
/// must be held until shutdown.
pub fn init_with_config(config: &LoggingConfig, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let mut guard = None;

    INIT.call_once(|| {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(build_filter(config));

        let mut file_layer = None;
        if let Some(dir) = log_dir {
            match std::fs::create_dir_all(dir) {
                Ok(()) => {
                    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
                    let (writer, file_guard) = tracing_appender::non_blocking(appender);
                    guard = Some(file_guard);
                    file_layer = Some(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false)
                            .with_target(true)
                            .with_thread_names(true)
                            .with_timer(FileTime)
                            .with_filter(build_filter(config)),
                    );
                }
                Err(e) => {
                    eprintln!("Cannot create log directory {}: {e}", dir.display());
                }
            }
        }

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .init();
    });

    guard
}

/// Log an event with component context.
///
/// # Examples
/// ```ignore
/// log_event!("sync", "created", "{}", page.url);
/// log_event!("watcher", "started");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("watcher", "unmatched", "{}", path.display());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}
