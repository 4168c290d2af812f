//! Logging for KisaanMitra.
//!
//! Dispatch decisions, history evictions and notification expiry all log
//! through `tracing`. The full stream goes to a daily file under the data
//! dir; the terminal only sees warnings so the chat transcript stays clean.

use anyhow::Result;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,kisaanmitra=debug";

/// Rolling files are named `<prefix>.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "kisaanmitra.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Terminal layer: warnings and errors only, printed above the chat prompt.
fn console_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(LevelFilter::WARN)
}

/// Initialize logging. Keep the returned guard alive in `main`; dropping it
/// flushes the file writer.
pub fn init() -> Result<(WorkerGuard, PathBuf)> {
    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(console_layer())
        .init();

    tracing::info!("Logging to {}", log_dir.display());

    Ok((guard, log_dir))
}

/// Directory holding the rolling log files; `kisaanmitra logs` reads from here.
pub fn log_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "kisaanmitra", "kisaanmitra")
        .ok_or_else(|| anyhow::anyhow!("Could not resolve log directory"))?;

    Ok(dirs.data_dir().join("logs"))
}

/// Test subscriber: same default filter, output captured by the test harness.
/// Safe to call more than once.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_log_dir_is_project_scoped() {
        // No home directory in some sandboxes
        if let Ok(dir) = log_dir() {
            assert!(dir.ends_with("logs"));
            assert!(dir.to_string_lossy().to_lowercase().contains("kisaanmitra"));
        }
    }
}
