//! Error taxonomy for the integrity engine.
//!
//! Variants line up with the propagation policy: `ConfigInvalid`, `StoreOpen`,
//! and `ThreadPool` are fatal during setup; everything else is caught at the
//! call site (per-file handler, scanner) and logged, never bubbled past it.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FfcError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("failed to open store at {path}: {source}")]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: heed::Error,
    },

    #[error("store transaction failed: {0}")]
    StoreTxn(#[source] heed::Error),

    #[error("store I/O failed: {0}")]
    StoreIO(#[source] heed::Error),

    #[error("stat failed for {path}: {source}")]
    FileStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read failed for {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("memory-map failed for {path}: {source}")]
    FileMap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("allocation failed for {path}")]
    Alloc { path: PathBuf },

    #[error("failed to open directory {path}: {source}")]
    DirOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create worker thread pool: {0}")]
    ThreadPool(String),
}

impl FfcError {
    /// True for errors that must abort the run during setup (before any worker starts).
    pub fn is_fatal_setup_error(&self) -> bool {
        matches!(
            self,
            FfcError::ConfigInvalid(_) | FfcError::StoreOpen { .. } | FfcError::ThreadPool(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FfcError>;
