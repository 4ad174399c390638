//! Content fingerprinting: a 64-bit, non-cryptographic, streaming hash
//! (xxh3) over whole file contents.
//!
//! Chooses between a memory map and chunked buffered reads based on the
//! per-worker memory budget rather than a fixed constant; xxh3 over a
//! cryptographic hash, since a file's fingerprint only needs to change when
//! the bytes do, not resist deliberate collision.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;
use xxhash_rust::xxh3::Xxh3;

use crate::error::{FfcError, Result};

/// Buffer-sizing and mmap-threshold tuning for fingerprinting.
pub struct FingerprintConsts;

impl FingerprintConsts {
    /// Use mmap when the file is smaller than this fraction of the worker's
    /// memory budget; above it, a large mapping risks starving other
    /// concurrently-mapped files under memory pressure, so fall back to
    /// chunked reads with a bounded buffer instead.
    pub const MMAP_BUDGET_FRACTION: f64 = 0.75;
    /// Floor for the chunked-read buffer, regardless of budget. 10 MiB.
    pub const MIN_READ_BUFFER: usize = 10 * 1024 * 1024;
    /// Ceiling for the chunked-read buffer, regardless of budget. 128 MiB.
    pub const MAX_READ_BUFFER: usize = 128 * 1024 * 1024;
}

/// Hash the bytes of `path` (already known to be `size` bytes long). Chooses
/// between a memory map and a chunked streaming read based on `size` and
/// `per_worker_budget`; either path yields the same digest for the same bytes.
pub fn hash_file(path: &Path, size: u64, per_worker_budget: u64) -> Result<u64> {
    let file = File::open(path).map_err(|source| FfcError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    if size == 0 {
        // xxh3 of the empty input is well-defined; no I/O needed.
        return Ok(Xxh3::new().digest());
    }

    let mmap_ceiling = (per_worker_budget as f64 * FingerprintConsts::MMAP_BUDGET_FRACTION) as u64;
    if size < mmap_ceiling {
        match unsafe { Mmap::map(&file) } {
            Ok(mmap) => {
                let mut hasher = Xxh3::new();
                hasher.update(&mmap);
                return Ok(hasher.digest());
            }
            Err(source) => {
                // Mapping failed (e.g. the file shrank to zero between stat and
                // map, or the host refused the mapping) — fall back to the
                // chunked reader over the already-open file rather than
                // failing outright. Only a failure in that fallback is fatal.
                log::debug!(
                    "{}",
                    FfcError::FileMap {
                        path: path.to_path_buf(),
                        source,
                    }
                );
                return hash_via_chunked_read(path, file, per_worker_budget);
            }
        }
    }

    hash_via_chunked_read(path, file, per_worker_budget)
}

fn hash_via_chunked_read(path: &Path, file: File, per_worker_budget: u64) -> Result<u64> {
    let buffer_size = ((per_worker_budget / 4) as usize)
        .clamp(FingerprintConsts::MIN_READ_BUFFER, FingerprintConsts::MAX_READ_BUFFER);
    let mut reader = std::io::BufReader::with_capacity(buffer_size, file);
    let mut buffer = vec![0u8; buffer_size];
    let mut hasher = Xxh3::new();
    loop {
        let n = reader.read(&mut buffer).map_err(|source| FfcError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.digest())
}
