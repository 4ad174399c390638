//! Public and internal types for the integrity engine: run configuration,
//! modes, and the change taxonomy.

use std::collections::HashSet;
use std::path::PathBuf;

/// The three modes of operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Write every file's record unconditionally.
    Populate,
    /// Compare every file's record to the store; never write.
    Verify,
    /// Compare every file's record to the store; write back on mismatch.
    Reconcile,
}

/// One kind of discrepancy between a file and its stored record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    HashMismatch,
    InodeChanged,
    LinksChanged,
    BlocksChanged,
    MissingInStore,
    MissingOnFilesystem,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::HashMismatch => "hash mismatch",
            ChangeKind::InodeChanged => "inode changed",
            ChangeKind::LinksChanged => "link count changed",
            ChangeKind::BlocksChanged => "block count changed",
            ChangeKind::MissingInStore => "missing in store",
            ChangeKind::MissingOnFilesystem => "missing on filesystem",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LMDB durability toggles. Each weakens the crash/power-loss guarantee in
/// exchange for throughput; all default to off (full durability).
#[derive(Clone, Copy, Debug, Default)]
pub struct DurabilityToggles {
    /// Reduce fsync frequency.
    pub no_sync: bool,
    /// Skip metadata syncs.
    pub no_meta_sync: bool,
    /// Allow the OS to flush asynchronously.
    pub map_async: bool,
    /// Use a writeable memory map.
    pub write_map: bool,
}

/// Logging sink configuration (`[logging]` section).
#[derive(Clone, Debug, Default)]
pub struct LoggingConfig {
    pub log_to_file_enabled: bool,
    /// Directory holding the log file `ffc.log`; created if missing.
    pub log_path: Option<PathBuf>,
}

/// Fully resolved run configuration: defaults, overridden by config file, overridden
/// by CLI flags. Built once at startup and immutable thereafter.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub mode: Mode,
    pub verbose: bool,

    pub worker_count: usize,
    pub total_memory_budget: u64,
    pub per_worker_budget: u64,

    pub store_path: PathBuf,
    pub store_max_bytes: u64,
    pub durability: DurabilityToggles,

    pub roots: Vec<PathBuf>,
    pub max_recursion_depth: u32,
    pub exclude_hidden: bool,
    pub exclude_directories: HashSet<PathBuf>,
    pub exclude_extensions: HashSet<String>,

    pub logging: LoggingConfig,
}
