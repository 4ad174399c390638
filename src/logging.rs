//! Logging setup: `env_logger` + `colored` terminal output, plus an optional
//! file-sink tee driven by `[logging] log_to_file_enabled` / `log_path` in
//! the config file.
//!
//! `log`'s own global logger registration gives every thread a "set up
//! once, call from anywhere" sink without any raw global pointer.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::types::LoggingConfig;

/// Wraps the `env_logger` terminal logger and an optional plain-text file
/// sink; both receive every record that passes the level filter.
struct TeeLogger {
    terminal: env_logger::Logger,
    file: Option<Mutex<std::fs::File>>,
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.terminal.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.terminal.log(record);
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(
                    f,
                    "[{}] [{}] {}",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        self.terminal.flush();
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

/// Install the global logger. `verbose` raises this crate's own level to
/// Debug; dependencies stay at Warn regardless.
pub fn setup_logging(verbose: bool, logging: &LoggingConfig) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::from_default_env();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    let path = record.target().to_string().white();
                    format!("[{} {} {}] {}", name.cyan(), level_str, path, record.args())
                }
                _ => format!("[{}] {}", name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        });
    let terminal = builder.build();
    let max_level = terminal.filter();

    let file = match (logging.log_to_file_enabled, &logging.log_path) {
        (true, Some(dir)) => open_log_file(dir).map(Mutex::new),
        (true, None) => {
            eprintln!("log_to_file_enabled is set but log_path is missing; logging to terminal only");
            None
        }
        _ => None,
    };

    let logger = TeeLogger { terminal, file };
    log::set_max_level(max_level);
    let _ = log::set_boxed_logger(Box::new(logger));
}

/// `dir` is the directory configured by `[logging] log_path` (spec.md §6:
/// "Directory holding the log file `ffc.log`; created if missing"), not the
/// log file itself.
fn open_log_file(dir: &Path) -> Option<std::fs::File> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("failed to create log directory {}: {e}", dir.display());
        return None;
    }
    let path = dir.join("ffc.log");
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("failed to open log file {}: {e}", path.display());
            None
        }
    }
}
