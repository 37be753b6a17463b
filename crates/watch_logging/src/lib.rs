#![deny(missing_docs)]
//! Shared logging utilities for the exam watch workspace.
//!
//! This crate provides the `watch_*` logging macros used across the codebase,
//! the process logger (console plus a size-rotating file) and a minimal test
//! initializer for the global logger.

mod rotate;

use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub use rotate::{backup_path, RotatingFile};

#[doc(hidden)]
pub use log as __log;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! watch_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! watch_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! watch_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! watch_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! watch_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!($($arg)*);
    }};
}

/// Settings for the process logger.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Minimum level written to every sink.
    pub level: LevelFilter,
    /// Log file path. `None` means console only.
    pub file: Option<PathBuf>,
    /// Size at which the log file is rotated.
    pub max_file_bytes: u64,
    /// Number of rotated files kept next to the active one.
    pub backups: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file: Some(PathBuf::from("exam_watch.log")),
            max_file_bytes: 5 * 1024 * 1024,
            backups: 3,
        }
    }
}

/// Installs the process logger: terminal output plus, when possible, a
/// rotating log file.
///
/// An unwritable log file never aborts the process: a warning is printed to
/// stderr and logging continues on the console only. Returns `true` when the
/// file sink is active.
pub fn initialize(settings: &LogSettings) -> bool {
    let (loggers, file_active) = build_loggers(settings);
    let _ = CombinedLogger::init(loggers);
    file_active
}

/// Assembles the sinks for `settings` without installing them.
fn build_loggers(settings: &LogSettings) -> (Vec<Box<dyn SharedLogger>>, bool) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        settings.level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    let Some(path) = settings.file.as_ref() else {
        return (loggers, false);
    };
    match RotatingFile::open(path, settings.max_file_bytes, settings.backups) {
        Ok(file) => {
            loggers.push(WriteLogger::new(settings.level, config, file));
            (loggers, true)
        }
        Err(err) => {
            eprintln!(
                "Warning: could not open log file at {:?}, logging to console only: {}",
                path, err
            );
            (loggers, false)
        }
    }
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
