//! Per-file handler: stats the file, fingerprints it, and dispatches on
//! [`Mode`] against the store.

use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::error::FfcError;
use crate::fingerprint;
use crate::store::record::FileRecord;
use crate::store::Store;
use crate::summary::Summary;
use crate::types::{ChangeKind, Mode};

/// Handle one path: stat it, fingerprint it, and apply the mode-specific
/// store transaction. Failures at any stage are logged and the path is
/// skipped; they never propagate out of this function.
pub fn handle_file(path: &Path, mode: Mode, store: &Store, per_worker_budget: u64, summary: &Summary) {
    if path.as_os_str().is_empty() {
        log::warn!("skipping empty path");
        return;
    }

    let metadata = match std::fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => return,
        Err(source) => {
            log::warn!(
                "{}",
                FfcError::FileStat {
                    path: path.to_path_buf(),
                    source,
                }
            );
            return;
        }
    };

    let fresh = FileRecord {
        hash: 0,
        inode: metadata.ino(),
        link_count: metadata.nlink(),
        block_count: metadata.blocks() as i64,
    };

    let hash = match fingerprint::hash_file(path, metadata.size(), per_worker_budget) {
        Ok(hash) => hash,
        Err(e) => {
            log::warn!("fingerprint failed for {}: {e}", path.display());
            return;
        }
    };
    let fresh = FileRecord { hash, ..fresh };

    match mode {
        Mode::Populate => populate(path, &fresh, store, summary),
        Mode::Verify => verify(path, &fresh, store, summary),
        Mode::Reconcile => reconcile(path, &fresh, store, summary),
    }
}

fn populate(path: &Path, fresh: &FileRecord, store: &Store, summary: &Summary) {
    let mut txn = match store.begin_write() {
        Ok(txn) => txn,
        Err(e) => {
            log::warn!("failed to open write transaction for {}: {e}", path.display());
            return;
        }
    };
    if let Err(e) = store.put(&mut txn, path, fresh) {
        log::warn!("put failed for {}: {e}", path.display());
        return;
    }
    if let Err(e) = store.commit(txn) {
        log::warn!("commit failed for {}: {e}", path.display());
        return;
    }
    summary.increment_processed();
}

fn verify(path: &Path, fresh: &FileRecord, store: &Store, summary: &Summary) {
    let txn = match store.begin_read() {
        Ok(txn) => txn,
        Err(e) => {
            log::warn!("failed to open read transaction for {}: {e}", path.display());
            return;
        }
    };
    let stored = match store.get(&txn, path) {
        Ok(stored) => stored,
        Err(e) => {
            log::warn!("get failed for {}: {e}", path.display());
            store.abort_read(txn);
            return;
        }
    };

    let mut any_change = false;
    match stored {
        None => {
            summary.record_change(path, ChangeKind::MissingInStore);
            any_change = true;
        }
        Some(stored) => {
            for kind in diff_record(&stored, fresh) {
                summary.record_change(path, kind);
                any_change = true;
            }
        }
    }
    store.abort_read(txn);

    if !any_change {
        summary.increment_processed();
    }
}

fn reconcile(path: &Path, fresh: &FileRecord, store: &Store, summary: &Summary) {
    let mut txn = match store.begin_write() {
        Ok(txn) => txn,
        Err(e) => {
            log::warn!("failed to open write transaction for {}: {e}", path.display());
            return;
        }
    };
    let stored = match store.get_rw(&txn, path) {
        Ok(stored) => stored,
        Err(e) => {
            log::warn!("get failed for {}: {e}", path.display());
            store.abort_write(txn);
            return;
        }
    };

    let needs_write = match &stored {
        None => true,
        Some(stored) => stored != fresh,
    };

    if needs_write {
        if let Err(e) = store.put(&mut txn, path, fresh) {
            log::warn!("put failed for {}: {e}", path.display());
            return;
        }
    }

    if let Err(e) = store.commit(txn) {
        log::warn!("commit failed for {}: {e}", path.display());
        return;
    }

    if needs_write {
        summary.increment_processed();
    }
}

/// The set of [`ChangeKind`]s by which `stored` and `fresh` differ. Empty
/// means the two records are identical.
fn diff_record(stored: &FileRecord, fresh: &FileRecord) -> Vec<ChangeKind> {
    let mut kinds = Vec::new();
    if stored.hash != fresh.hash {
        kinds.push(ChangeKind::HashMismatch);
    }
    if stored.inode != fresh.inode {
        kinds.push(ChangeKind::InodeChanged);
    }
    if stored.link_count != fresh.link_count {
        kinds.push(ChangeKind::LinksChanged);
    }
    if stored.block_count != fresh.block_count {
        kinds.push(ChangeKind::BlocksChanged);
    }
    kinds
}
