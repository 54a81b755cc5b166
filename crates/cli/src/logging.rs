//! Logging setup for the gsp binary
//!
//! Stdout carries the program's result, so logs never go there: they go to
//! stderr, or to a log file when `[log] file` is set.

use std::path::Path;

use gsp_core::{HomeDir, LogConfig};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Parse log level from config string
fn parse_log_level(level: &str) -> LevelFilter {
  match level.trim().to_lowercase().as_str() {
    "off" => LevelFilter::OFF,
    "error" => LevelFilter::ERROR,
    "warn" | "warning" => LevelFilter::WARN,
    "info" => LevelFilter::INFO,
    "debug" => LevelFilter::DEBUG,
    "trace" => LevelFilter::TRACE,
    _ => LevelFilter::WARN,
  }
}

/// Initialize logging from the `[log]` section (defaults when the config
/// could not be loaded).
///
/// `RUST_LOG` overrides the configured level. Returns the guard that must be
/// kept alive for the duration of the program when logging to a file.
pub fn init_logging(config: Option<&LogConfig>, home: Option<&HomeDir>) -> Option<WorkerGuard> {
  let defaults = LogConfig::default();
  let config = config.unwrap_or(&defaults);

  let env_filter = EnvFilter::builder()
    .with_default_directive(parse_log_level(&config.level).into())
    .from_env_lossy();

  let Some(file) = config.file.as_deref() else {
    init_stderr_logging(env_filter);
    return None;
  };

  let file = match home {
    Some(home) => home.expand(file),
    None => file.to_string(),
  };
  let path = Path::new(&file);
  let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
    init_stderr_logging(env_filter);
    return None;
  };

  if !dir.as_os_str().is_empty() && std::fs::create_dir_all(dir).is_err() {
    // Fall back to stderr logging
    init_stderr_logging(env_filter);
    return None;
  }
  let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };

  let file_appender = match config.rotation.as_str() {
    "hourly" => tracing_appender::rolling::hourly(dir, name),
    "daily" => tracing_appender::rolling::daily(dir, name),
    _ => tracing_appender::rolling::never(dir, name),
  };

  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(true)
    .with_ansi(false)
    .with_writer(file_writer)
    .init();

  Some(guard)
}

fn init_stderr_logging(env_filter: EnvFilter) {
  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}
