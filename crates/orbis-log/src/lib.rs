//! Structured logging for the orbis terrain streamer.
//!
//! Library crates emit `tracing` events and spans (`terrain_tick` per update
//! pass, tile lifecycle at `debug`, precompute rebuilds at `info`). This crate
//! installs the subscriber that renders them: a console layer with uptime
//! timestamps, plus a JSON file layer in debug builds for offline analysis.
//! Events from the `log` facade are bridged into the same pipeline.

use orbis_config::Config;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name of the JSON log written in debug builds.
pub const LOG_FILE_NAME: &str = "orbis.log";

const DEFAULT_FILTER: &str = "info";

/// Initialize the global tracing subscriber.
///
/// Filter precedence: `RUST_LOG`, then `config.debug.log_level`, then
/// `info`. When `debug_build` is set and `log_dir` is writable, a JSON copy
/// of every event goes to [`LOG_FILE_NAME`] inside it.
///
/// # Examples
///
/// ```no_run
/// use orbis_config::Config;
/// use orbis_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let directive = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && let Some(log_file) = open_log_file(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::debug!(%directive, log_dir = %log_dir.display(), "logging initialized");
        return;
    }

    subscriber.init();
    tracing::debug!(%directive, "logging initialized");
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// Filter directive derived from the config, falling back to `info`.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.trim().to_string()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create `log_dir` if needed and truncate the log file inside it.
fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}
