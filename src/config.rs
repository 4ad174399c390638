//! Config-file loading and CLI-override merging into a [`RunConfig`].
//!
//! Section layout follows the original program's `/etc/ffc.conf`: `[settings]`
//! for threading/RAM, `[database]` for the store, `[logging]` for the log
//! sink, `[scanning]` for the walk. Missing or unparsable values fall back to
//! defaults rather than failing the run, matching the original's "print a
//! warning, keep going" behavior; only a handful of genuinely unusable cases
//! (documented per key below) reject the config outright.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ini::Ini;
use sysinfo::System;

use crate::error::{FfcError, Result};
use crate::types::{DurabilityToggles, LoggingConfig, Mode, RunConfig};

/// Defaults mirroring the original program's `config.h`.
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const DB_PATH: &'static str = "/var/lib/ffc/ffc.db";
    /// Directory holding `ffc.log`, not the log file itself (spec.md §6).
    pub const LOG_PATH: &'static str = "/var/log/ffc";
    pub const DB_SIZE_MB: u64 = 15;
    pub const RAM_USAGE_PERCENT: u64 = 70;
    pub const MAX_RECURSION_DEPTH: u32 = 10;
    pub const LOG_TO_FILE: bool = true;
    pub const EXCLUDE_HIDDEN: bool = true;

    pub const RAM_USAGE_PERCENT_MIN: u64 = 10;
    pub const RAM_USAGE_PERCENT_MAX: u64 = 90;
    pub const DB_SIZE_MB_MIN: u64 = 5;
    pub const MAX_RECURSION_DEPTH_MAX: u32 = 64;
}

/// CLI-level overrides layered on top of the config file.
pub struct CliOverrides {
    pub mode: Mode,
    pub verbose: bool,
}

/// Load `path` (if present) and merge `overrides` to produce a [`RunConfig`].
/// A missing config file is not an error: the run proceeds on defaults, same
/// as the original program.
pub fn load(path: &Path, overrides: CliOverrides) -> Result<RunConfig> {
    let ini = match Ini::load_from_file(path) {
        Ok(ini) => Some(ini),
        Err(ini::Error::Io(_)) => {
            log::warn!(
                "config file not found at {}, using default settings",
                path.display()
            );
            None
        }
        Err(e) => {
            return Err(FfcError::ConfigInvalid(format!(
                "failed to parse {}: {e}",
                path.display()
            )));
        }
    };

    let settings = ini.as_ref().and_then(|i| i.section(Some("settings")));
    let database = ini.as_ref().and_then(|i| i.section(Some("database")));
    let logging = ini.as_ref().and_then(|i| i.section(Some("logging")));
    let scanning = ini.as_ref().and_then(|i| i.section(Some("scanning")));

    let default_threads = default_worker_count();
    let worker_count = settings
        .and_then(|s| s.get("threads_count"))
        .and_then(|v| parse_warn("threads_count", v))
        .map(|t: u64| {
            if t == 0 || t as usize > default_threads {
                log::warn!(
                    "invalid threads_count {t}, using the host-derived default ({default_threads})"
                );
                default_threads
            } else {
                t as usize
            }
        })
        .unwrap_or(default_threads);

    let ram_usage_percent = settings
        .and_then(|s| s.get("ram_usage_percent"))
        .and_then(|v| parse_warn("ram_usage_percent", v))
        .map(|p: u64| {
            if !(ConfigDefaults::RAM_USAGE_PERCENT_MIN..=ConfigDefaults::RAM_USAGE_PERCENT_MAX)
                .contains(&p)
            {
                log::warn!("invalid ram_usage_percent {p}, using the default");
                ConfigDefaults::RAM_USAGE_PERCENT
            } else {
                p
            }
        })
        .unwrap_or(ConfigDefaults::RAM_USAGE_PERCENT);

    let mut sys = System::new();
    sys.refresh_memory();
    let available_bytes = sys.available_memory();
    let total_memory_budget = available_bytes * ram_usage_percent / 100;
    let per_worker_budget = total_memory_budget / worker_count.max(1) as u64;

    let db_size_mb = database
        .and_then(|s| s.get("db_size_mb"))
        .and_then(|v| parse_warn("db_size_mb", v))
        .map(|mb: u64| mb.max(ConfigDefaults::DB_SIZE_MB_MIN))
        .unwrap_or(ConfigDefaults::DB_SIZE_MB);

    let store_path = database
        .and_then(|s| s.get("db_path"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(ConfigDefaults::DB_PATH));

    let durability = DurabilityToggles {
        no_sync: database.and_then(|s| s.get("db_nosync")).map(parse_bool).unwrap_or(false),
        no_meta_sync: database
            .and_then(|s| s.get("db_nometasync"))
            .map(parse_bool)
            .unwrap_or(false),
        map_async: database.and_then(|s| s.get("db_mapasync")).map(parse_bool).unwrap_or(false),
        write_map: database.and_then(|s| s.get("db_writemap")).map(parse_bool).unwrap_or(false),
    };

    let log_to_file_enabled = logging
        .and_then(|s| s.get("log_to_file_enabled"))
        .map(parse_bool)
        .unwrap_or(ConfigDefaults::LOG_TO_FILE);
    let log_path = logging
        .and_then(|s| s.get("log_path"))
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from(ConfigDefaults::LOG_PATH)));

    let roots = scanning
        .and_then(|s| s.get("directories"))
        .map(|v| split_on(v, ',').into_iter().map(PathBuf::from).collect::<Vec<_>>())
        .ok_or_else(|| FfcError::ConfigInvalid("missing required [scanning] directories".into()))?;
    if roots.is_empty() {
        return Err(FfcError::ConfigInvalid(
            "[scanning] directories must list at least one path".into(),
        ));
    }

    let max_recursion_depth = scanning
        .and_then(|s| s.get("max_recursion_depth"))
        .and_then(|v| parse_warn("max_recursion_depth", v))
        .map(|d: u32| {
            if d > ConfigDefaults::MAX_RECURSION_DEPTH_MAX {
                log::warn!(
                    "invalid max_recursion_depth {d} (must be <= {}), using the default",
                    ConfigDefaults::MAX_RECURSION_DEPTH_MAX
                );
                ConfigDefaults::MAX_RECURSION_DEPTH
            } else {
                d
            }
        })
        .unwrap_or(ConfigDefaults::MAX_RECURSION_DEPTH);

    let exclude_hidden = scanning
        .and_then(|s| s.get("exclude_hidden"))
        .map(parse_bool)
        .unwrap_or(ConfigDefaults::EXCLUDE_HIDDEN);

    let exclude_directories: HashSet<PathBuf> = scanning
        .and_then(|s| s.get("exclude_directories"))
        .map(|v| split_on(v, ';').into_iter().map(PathBuf::from).collect())
        .unwrap_or_default();

    let exclude_extensions: HashSet<String> = scanning
        .and_then(|s| s.get("exclude_extensions"))
        .map(|v| split_on(v, ';').into_iter().collect())
        .unwrap_or_default();

    Ok(RunConfig {
        mode: overrides.mode,
        verbose: overrides.verbose,
        worker_count,
        total_memory_budget,
        per_worker_budget,
        store_path,
        store_max_bytes: db_size_mb * 1024 * 1024,
        durability,
        roots,
        max_recursion_depth,
        exclude_hidden,
        exclude_directories,
        exclude_extensions,
        logging: LoggingConfig {
            log_to_file_enabled,
            log_path,
        },
    })
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(2)
        .max(1)
}

fn parse_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("invalid number for {key}: {raw}. Using the default value instead.");
            None
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Split a `sep`-separated list, trimming whitespace and dropping empty
/// entries. `directories` uses `,` (spec.md §6); `exclude_directories` and
/// `exclude_extensions` use `;` — different separators, preserved exactly
/// rather than harmonized.
fn split_on(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_conf(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("ffc.conf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn overrides() -> CliOverrides {
        CliOverrides {
            mode: Mode::Verify,
            verbose: false,
        }
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults_but_requires_directories() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such.conf");
        let err = load(&missing, overrides()).unwrap_err();
        assert!(matches!(err, FfcError::ConfigInvalid(_)));
    }

    #[test]
    fn minimal_config_resolves_required_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            dir.path(),
            "[scanning]\ndirectories = /tmp/a,/tmp/b\n",
        );
        let cfg = load(&path, overrides()).unwrap();
        assert_eq!(cfg.roots, vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]);
        assert_eq!(cfg.store_path, PathBuf::from(ConfigDefaults::DB_PATH));
        assert_eq!(cfg.max_recursion_depth, ConfigDefaults::MAX_RECURSION_DEPTH);
    }

    #[test]
    fn out_of_range_ram_percent_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            dir.path(),
            "[settings]\nram_usage_percent = 5\n[scanning]\ndirectories = /tmp\n",
        );
        let cfg = load(&path, overrides()).unwrap();
        // total_memory_budget is derived from the (corrected) default percent,
        // not from the out-of-range value that was supplied.
        assert!(cfg.total_memory_budget > 0);
    }

    #[test]
    fn out_of_range_max_recursion_depth_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            dir.path(),
            "[scanning]\ndirectories = /tmp\nmax_recursion_depth = 65\n",
        );
        let cfg = load(&path, overrides()).unwrap();
        assert_eq!(cfg.max_recursion_depth, ConfigDefaults::MAX_RECURSION_DEPTH);
    }

    #[test]
    fn max_recursion_depth_at_upper_bound_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            dir.path(),
            "[scanning]\ndirectories = /tmp\nmax_recursion_depth = 64\n",
        );
        let cfg = load(&path, overrides()).unwrap();
        assert_eq!(cfg.max_recursion_depth, 64);
    }

    #[test]
    fn log_path_default_is_a_directory_not_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(dir.path(), "[scanning]\ndirectories = /tmp\n");
        let cfg = load(&path, overrides()).unwrap();
        assert_eq!(cfg.logging.log_path, Some(PathBuf::from(ConfigDefaults::LOG_PATH)));
        assert!(!ConfigDefaults::LOG_PATH.ends_with("ffc.log"));
    }

    #[test]
    fn exclude_lists_split_on_semicolon_and_trim() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            dir.path(),
            "[scanning]\ndirectories = /tmp\nexclude_extensions = .tmp ; .log;  .bak\n",
        );
        let cfg = load(&path, overrides()).unwrap();
        assert!(cfg.exclude_extensions.contains(".tmp"));
        assert!(cfg.exclude_extensions.contains(".log"));
        assert!(cfg.exclude_extensions.contains(".bak"));
    }

    #[test]
    fn directories_use_comma_not_semicolon_as_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            dir.path(),
            "[scanning]\ndirectories = /tmp/a, /tmp/b\nexclude_directories = /tmp/a/skip;/tmp/b/skip\n",
        );
        let cfg = load(&path, overrides()).unwrap();
        assert_eq!(cfg.roots, vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]);
        assert!(cfg.exclude_directories.contains(&PathBuf::from("/tmp/a/skip")));
        assert!(cfg.exclude_directories.contains(&PathBuf::from("/tmp/b/skip")));
    }
}
