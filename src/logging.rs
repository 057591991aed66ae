//! Logging setup for the `tabsim` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! application's job. [`init`] writes to stderr and to daily-rotating files
//! in the platform data directory:
//!
//! - `tabsim.<date>.log`: everything the filter lets through
//! - `error.<date>.log`: warnings and errors only
//!
//! ```no_run
//! tabsim::logging::init()?;
//! tracing::info!("ready");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Library callers that want events from one ingestion call only can attach
//! a dispatcher to the context instead, see
//! [`ExecutionContext::with_dispatch`](crate::context::ExecutionContext::with_dispatch).

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const LOG_PREFIX: &str = "tabsim";
const ERROR_LOG_PREFIX: &str = "error";

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/tabsim/logs`
/// - macOS: `~/Library/Application Support/tabsim/logs`
/// - Linux: `~/.local/share/tabsim/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;

    let log_dir = base_dir.join("tabsim").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Initializes logging at `info`, overridable with `RUST_LOG`.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or file appenders fail
pub fn init() -> Result<()> {
    init_with_default("info")
}

/// Like [`init`], with `directive` as the filter when `RUST_LOG` is unset.
pub fn init_with_default(directive: &str) -> Result<()> {
    let log_dir = get_log_dir()?;

    let all_logs_appender = rolling_appender(&log_dir, LOG_PREFIX)?;
    let error_logs_appender = rolling_appender(&log_dir, ERROR_LOG_PREFIX)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .context("Failed to create env filter")?;

    // stdout carries command output, so the console layer goes to stderr.
    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .pretty();

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("A global subscriber is already installed")?;

    tracing::debug!("Logging initialized, log directory: {:?}", log_dir);

    Ok(())
}

fn rolling_appender(log_dir: &std::path::Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} log appender"))
}

/// Gets the path to today's log file
pub fn get_current_log_path() -> Result<PathBuf> {
    dated_log_path(LOG_PREFIX)
}

/// Gets the path to today's error log file
pub fn get_current_error_log_path() -> Result<PathBuf> {
    dated_log_path(ERROR_LOG_PREFIX)
}

fn dated_log_path(prefix: &str) -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Ok(log_dir.join(format!("{prefix}.{today}.log")))
}
