//! Tracing subscriber setup.
//!
//! Logs go to stderr and to a daily-rolling file in
//! [`stowbar_types::logging::log_dir`]. `RUST_LOG` overrides the default filter.

use stowbar_types::logging::{ensure_log_dir, LOG_FILE_PREFIX};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the application subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the file writer. Returns `None` (stderr only) when the
/// log directory cannot be created.
pub fn init_logging() -> Option<WorkerGuard> {
    let filter = env_filter("info");
    let stderr = fmt::layer().with_writer(std::io::stderr);

    let dir = match ensure_log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            let _ = Registry::default().with(filter).with(stderr).try_init();
            tracing::warn!("Failed to create log directory: {}. Logging to stderr only.", e);
            return None;
        }
    };

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer().with_ansi(false).with_writer(writer);

    if Registry::default()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()
        .is_err()
    {
        // Someone else installed a subscriber first.
        return None;
    }
    tracing::info!("Logging to {:?}", dir);
    Some(guard)
}

/// Stderr-only subscriber at `default_level`, for command-line tools.
pub fn init_stderr_logging(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .try_init();
}
