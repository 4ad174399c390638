//! Persistent ordered key-value store: a thin wrapper over an LMDB
//! environment (`heed`).
//!
//! Keys are absolute paths with a trailing NUL (see [`record::store_key`]);
//! values are fixed-shape [`record::FileRecord`]s. LMDB's own single-writer
//! lock enforces "at most one write transaction in flight" for us — the
//! store does not need a mutex of its own on top of it.

pub mod record;

use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions, RoTxn, RwTxn};

use crate::error::{FfcError, Result};
use crate::types::DurabilityToggles;
use record::{FileRecord, RECORD_LEN};

/// Reserved key holding the on-disk format tag. Not a valid path (a real path
/// key always ends in exactly one NUL following non-NUL path bytes), so it
/// can never collide with a real entry.
const FORMAT_VERSION_KEY: &[u8] = b"\0ffc-format-version\0";

/// Current on-disk format: 64-bit xxh3 hash + u64 inode/link_count + i64 block_count,
/// little-endian, 32 bytes per record.
const FORMAT_VERSION: u8 = 1;

/// Read-only transaction. Any number may be open concurrently with each
/// other and with the writer, observing a consistent snapshot.
pub type ReadTxn<'env> = RoTxn<'env>;
/// Write transaction. At most one may be in flight at a time.
pub type WriteTxn<'env> = RwTxn<'env>;

pub struct Store {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl Store {
    /// Create-if-missing; map into the process address space with `max_bytes`
    /// as the upper bound on on-disk growth. `max_readers` should comfortably
    /// exceed `worker_count` (each worker holds a brief read transaction
    /// during Verify, plus the reconciliation pass and any CLI tooling).
    pub fn open(
        path: &Path,
        max_bytes: u64,
        max_readers: u32,
        durability: DurabilityToggles,
    ) -> Result<Store> {
        std::fs::create_dir_all(path).map_err(|source| FfcError::StoreOpen {
            path: path.to_path_buf(),
            source: heed::Error::Io(source),
        })?;

        let mut flags = EnvFlags::empty();
        if durability.no_sync {
            flags |= EnvFlags::NO_SYNC;
        }
        if durability.no_meta_sync {
            flags |= EnvFlags::NO_META_SYNC;
        }
        if durability.map_async {
            flags |= EnvFlags::MAP_ASYNC;
        }
        if durability.write_map {
            flags |= EnvFlags::WRITE_MAP;
        }

        let mut options = EnvOpenOptions::new();
        options.map_size(max_bytes as usize);
        options.max_dbs(1);
        options.max_readers(max_readers);
        options.flags(flags);

        // Safety: the caller guarantees no other incompatible process has
        // this environment's memory map open with different flags/map_size.
        let env = unsafe { options.open(path) }.map_err(|source| FfcError::StoreOpen {
            path: path.to_path_buf(),
            source,
        })?;

        let mut wtxn = env.write_txn().map_err(FfcError::StoreTxn)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(FfcError::StoreIO)?;

        match db.get(&wtxn, FORMAT_VERSION_KEY).map_err(FfcError::StoreIO)? {
            None => {
                db.put(&mut wtxn, FORMAT_VERSION_KEY, &[FORMAT_VERSION])
                    .map_err(FfcError::StoreIO)?;
            }
            Some(tag) if tag == [FORMAT_VERSION] => {}
            Some(_) => {
                return Err(FfcError::StoreOpen {
                    path: path.to_path_buf(),
                    source: heed::Error::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "store was written with an incompatible format version",
                    )),
                });
            }
        }
        wtxn.commit().map_err(FfcError::StoreTxn)?;

        Ok(Store { env, db })
    }

    pub fn begin_read(&self) -> Result<ReadTxn<'_>> {
        self.env.read_txn().map_err(FfcError::StoreTxn)
    }

    pub fn begin_write(&self) -> Result<WriteTxn<'_>> {
        self.env.write_txn().map_err(FfcError::StoreTxn)
    }

    pub fn get(&self, txn: &ReadTxn<'_>, path: &Path) -> Result<Option<FileRecord>> {
        let key = record::store_key(path);
        let bytes = self.db.get(txn, &key).map_err(FfcError::StoreIO)?;
        Ok(bytes.and_then(FileRecord::from_bytes))
    }

    /// Read through a write transaction (used by Reconcile, which shares one
    /// transaction across get+put for a given path).
    pub fn get_rw(&self, txn: &WriteTxn<'_>, path: &Path) -> Result<Option<FileRecord>> {
        let key = record::store_key(path);
        let bytes = self.db.get(txn, &key).map_err(FfcError::StoreIO)?;
        Ok(bytes.and_then(FileRecord::from_bytes))
    }

    pub fn put(&self, txn: &mut WriteTxn<'_>, path: &Path, rec: &FileRecord) -> Result<()> {
        let key = record::store_key(path);
        self.db
            .put(txn, &key, &rec.to_bytes())
            .map_err(FfcError::StoreIO)
    }

    pub fn delete(&self, txn: &mut WriteTxn<'_>, path: &Path) -> Result<()> {
        let key = record::store_key(path);
        self.db.delete(txn, &key).map_err(FfcError::StoreIO)?;
        Ok(())
    }

    /// Iterate all path entries (skipping the reserved format-version key) in
    /// ascending key order, i.e. ascending path byte order.
    pub fn cursor<'txn>(
        &self,
        txn: &'txn ReadTxn<'_>,
    ) -> Result<impl Iterator<Item = Result<(PathBuf, FileRecord)>> + 'txn> {
        let iter = self.db.iter(txn).map_err(FfcError::StoreIO)?;
        Ok(iter.filter_map(|entry| match entry {
            Ok((key, _)) if key == FORMAT_VERSION_KEY => None,
            Ok((key, value)) => {
                let path = record::path_from_key(key)?.to_path_buf();
                let rec = FileRecord::from_bytes(value);
                rec.map(|rec| Ok((path, rec)))
            }
            Err(e) => Some(Err(FfcError::StoreIO(e))),
        }))
    }

    pub fn commit(&self, txn: WriteTxn<'_>) -> Result<()> {
        txn.commit().map_err(FfcError::StoreTxn)
    }

    /// Abort a write transaction: discard all puts/deletes since `begin_write`.
    pub fn abort_write(&self, txn: WriteTxn<'_>) {
        txn.abort();
    }

    /// Abort (release) a read transaction. A no-op beyond dropping the
    /// snapshot; provided for symmetry with `abort_write`.
    pub fn abort_read(&self, txn: ReadTxn<'_>) {
        drop(txn);
    }

    pub fn close(self) {
        drop(self);
    }
}
