//! Reconciliation pass: runs once after the worker pool drains, in Verify
//! and Reconcile modes only. Walks every stored path via a cursor and
//! checks it still exists on the filesystem.

use crate::store::Store;
use crate::summary::Summary;
use crate::types::{ChangeKind, Mode};

/// Run the reconciliation pass for `mode`. A no-op for Populate (the
/// caller should not invoke this for that mode, but it's harmless if it does:
/// there is nothing to reconcile against a store that was just written).
pub fn run(store: &Store, mode: Mode, summary: &Summary) {
    match mode {
        Mode::Populate => {}
        Mode::Verify => verify_pass(store, summary),
        Mode::Reconcile => reconcile_pass(store, summary),
    }
}

fn verify_pass(store: &Store, summary: &Summary) {
    let txn = match store.begin_read() {
        Ok(txn) => txn,
        Err(e) => {
            log::warn!("reconciliation pass failed to open read transaction: {e}");
            return;
        }
    };

    let entries: Vec<_> = match store.cursor(&txn) {
        Ok(cursor) => cursor.filter_map(Result::ok).collect(),
        Err(e) => {
            log::warn!("reconciliation pass failed to open cursor: {e}");
            store.abort_read(txn);
            return;
        }
    };

    for (path, _record) in entries {
        if !path.exists() {
            summary.record_change(&path, ChangeKind::MissingOnFilesystem);
        }
    }
    store.abort_read(txn);
}

fn reconcile_pass(store: &Store, summary: &Summary) {
    let mut txn = match store.begin_write() {
        Ok(txn) => txn,
        Err(e) => {
            log::warn!("reconciliation pass failed to open write transaction: {e}");
            return;
        }
    };

    let entries: Vec<_> = match store.cursor(&txn) {
        Ok(cursor) => cursor.filter_map(Result::ok).collect(),
        Err(e) => {
            log::warn!("reconciliation pass failed to open cursor: {e}");
            store.abort_write(txn);
            return;
        }
    };

    let mut removed = Vec::new();
    for (path, _record) in entries {
        if !path.exists() {
            if let Err(e) = store.delete(&mut txn, &path) {
                log::warn!("failed to delete stale entry for {}: {e}", path.display());
                continue;
            }
            removed.push(path);
        }
    }

    if let Err(e) = store.commit(txn) {
        log::warn!("reconciliation pass failed to commit: {e}");
        return;
    }

    for path in removed {
        summary.record_change(&path, ChangeKind::MissingOnFilesystem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::FileRecord;
    use crate::types::DurabilityToggles;

    fn rec() -> FileRecord {
        FileRecord {
            hash: 1,
            inode: 1,
            link_count: 1,
            block_count: 1,
        }
    }

    #[test]
    fn verify_pass_records_missing_on_filesystem_without_deleting() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), 10 * 1024 * 1024, 16, DurabilityToggles::default()).unwrap();
        let ghost = std::path::PathBuf::from("/definitely/does/not/exist/anywhere");

        let mut wtxn = store.begin_write().unwrap();
        store.put(&mut wtxn, &ghost, &rec()).unwrap();
        store.commit(wtxn).unwrap();

        let summary = Summary::new();
        run(&store, Mode::Verify, &summary);

        let rtxn = store.begin_read().unwrap();
        assert!(store.get(&rtxn, &ghost).unwrap().is_some());
    }

    #[test]
    fn reconcile_pass_deletes_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), 10 * 1024 * 1024, 16, DurabilityToggles::default()).unwrap();
        let ghost = std::path::PathBuf::from("/definitely/does/not/exist/anywhere/either");

        let mut wtxn = store.begin_write().unwrap();
        store.put(&mut wtxn, &ghost, &rec()).unwrap();
        store.commit(wtxn).unwrap();

        let summary = Summary::new();
        run(&store, Mode::Reconcile, &summary);

        let rtxn = store.begin_read().unwrap();
        assert!(store.get(&rtxn, &ghost).unwrap().is_none());
    }

    #[test]
    fn reconcile_pass_leaves_existing_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), 10 * 1024 * 1024, 16, DurabilityToggles::default()).unwrap();
        let file_dir = tempfile::tempdir().unwrap();
        let path = file_dir.path().join("present.txt");
        std::fs::write(&path, b"still here").unwrap();

        let mut wtxn = store.begin_write().unwrap();
        store.put(&mut wtxn, &path, &rec()).unwrap();
        store.commit(wtxn).unwrap();

        let summary = Summary::new();
        run(&store, Mode::Reconcile, &summary);

        let rtxn = store.begin_read().unwrap();
        assert!(store.get(&rtxn, &path).unwrap().is_some());
    }
}
