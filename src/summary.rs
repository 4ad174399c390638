//! Run summary: per-kind change counts, an affected-file change log, and the
//! end-of-run report. Shared across worker threads behind a single internal
//! mutex — contention is fine here, a summary update is one map insert plus
//! a handful of counter increments per file, nowhere near the cost of the
//! I/O and hashing that dominates a worker's time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::types::{ChangeKind, Mode};

#[derive(Default)]
struct SummaryState {
    total_files_processed: u64,
    files_with_changes: u64,
    hash_mismatches: u64,
    inode_changes: u64,
    link_changes: u64,
    block_changes: u64,
    missing_in_store: u64,
    missing_on_filesystem: u64,
    changed_files: HashMap<PathBuf, Vec<ChangeKind>>,
}

pub struct Summary {
    state: Mutex<SummaryState>,
}

impl Default for Summary {
    fn default() -> Self {
        Summary {
            state: Mutex::new(SummaryState::default()),
        }
    }
}

impl Summary {
    pub fn new() -> Summary {
        Summary::default()
    }

    pub fn increment_processed(&self) {
        self.state.lock().unwrap().total_files_processed += 1;
    }

    /// Record one discrepancy for `path`. `files_with_changes` increments
    /// exactly once per path no matter how many kinds accumulate against it.
    pub fn record_change(&self, path: &Path, kind: ChangeKind) {
        let mut state = self.state.lock().unwrap();
        let is_new = !state.changed_files.contains_key(path);
        state
            .changed_files
            .entry(path.to_path_buf())
            .or_default()
            .push(kind);
        if is_new {
            state.files_with_changes += 1;
        }
        match kind {
            ChangeKind::HashMismatch => state.hash_mismatches += 1,
            ChangeKind::InodeChanged => state.inode_changes += 1,
            ChangeKind::LinksChanged => state.link_changes += 1,
            ChangeKind::BlocksChanged => state.block_changes += 1,
            ChangeKind::MissingInStore => state.missing_in_store += 1,
            ChangeKind::MissingOnFilesystem => state.missing_on_filesystem += 1,
        }
    }

    /// Print the end-of-run report. Populate and Reconcile get a one-line
    /// confirmation; Verify gets the full changes breakdown.
    pub fn print(&self, mode: Mode) {
        let state = self.state.lock().unwrap();
        println!("\n=== Summary ===");
        println!("Total files processed: {}", state.total_files_processed);

        match mode {
            Mode::Verify => {
                if state.files_with_changes > 0 {
                    println!("Files with changes: {}", state.files_with_changes);
                    println!("\nChanges breakdown:");
                    println!("- Hash mismatches: {}", state.hash_mismatches);
                    println!("- Inode changes: {}", state.inode_changes);
                    println!("- Link count changes: {}", state.link_changes);
                    println!("- Block count changes: {}", state.block_changes);
                    println!("- Missing in the store: {}", state.missing_in_store);
                    println!("- Missing on the filesystem: {}", state.missing_on_filesystem);
                    println!("\nAffected files:");
                    for (path, changes) in &state.changed_files {
                        println!("{}:", path.display());
                        for change in changes {
                            println!("  - {change}");
                        }
                    }
                } else {
                    println!("No changes detected.");
                }
            }
            Mode::Populate => println!("Database population completed successfully."),
            Mode::Reconcile => println!("Database update completed successfully."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_with_changes_counts_paths_not_change_events() {
        let summary = Summary::new();
        summary.record_change(Path::new("/a"), ChangeKind::HashMismatch);
        summary.record_change(Path::new("/a"), ChangeKind::InodeChanged);
        summary.record_change(Path::new("/b"), ChangeKind::HashMismatch);

        let state = summary.state.lock().unwrap();
        assert_eq!(state.files_with_changes, 2);
        assert_eq!(state.hash_mismatches, 2);
        assert_eq!(state.inode_changes, 1);
    }

    #[test]
    fn processed_counter_is_independent_of_changes() {
        let summary = Summary::new();
        summary.increment_processed();
        summary.increment_processed();
        let state = summary.state.lock().unwrap();
        assert_eq!(state.total_files_processed, 2);
        assert_eq!(state.files_with_changes, 0);
    }
}
