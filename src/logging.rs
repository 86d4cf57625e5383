//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the CLI level when set. With a log file, events are
//! appended to it (no ANSI colours) instead of going to stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use clap::ValueEnum;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(level: LogLevel, log_file: Option<&Path>) -> Result<(), AppError> {
    let show_target = level == LogLevel::Debug;

    let installed = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(|e| {
                    AppError::new(2, format!("Cannot create log directory {}: {e}", dir.display()))
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::new(2, format!("Cannot open log file {}: {e}", path.display()))
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_target(show_target)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(env_filter(level))
            .with_target(show_target)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    match installed {
        Ok(()) => debug!(level = level.as_str(), "logging initialised"),
        Err(e) => debug!(error = %e, "subscriber already installed"),
    }
    Ok(())
}
