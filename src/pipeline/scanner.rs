//! Directory scanner thread: walks the configured roots, applies the
//! exclude/hidden filters, and feeds the bounded file queue.
//!
//! Recursion is hand-rolled rather than built on `walkdir` because the
//! original scanner tracks visited directories by canonical path to break
//! symlink cycles regardless of whether links are followed, and batches
//! queue pushes in groups of 1000 before applying back-pressure.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use crate::types::RunConfig;

/// Paths are buffered in groups of this size before being pushed to the
/// queue, so a slow consumer doesn't force the scanner to make a channel
/// call per file.
const QUEUE_BUFFER_SIZE: usize = 1000;

struct ScanContext<'a> {
    exclude_hidden: bool,
    excluded_dirs: &'a HashSet<PathBuf>,
    excluded_exts: &'a HashSet<String>,
}

fn should_skip_entry(entry_name: &str, full_path: &Path, ctx: &ScanContext<'_>) -> bool {
    if ctx.exclude_hidden && entry_name.starts_with('.') {
        return true;
    }
    if ctx.excluded_dirs.contains(full_path) {
        return true;
    }
    if let Some(ext) = Path::new(entry_name).extension().and_then(|e| e.to_str()) {
        let dotted = format!(".{ext}");
        if ctx.excluded_exts.contains(&dotted) {
            return true;
        }
    }
    false
}

fn flush_buffer(buffer: &mut Vec<PathBuf>, sender: &Sender<PathBuf>) {
    for path in buffer.drain(..) {
        // `send` blocks once the queue is full, which is the back-pressure
        // the original achieved by polling `g_async_queue_length`.
        if sender.send(path).is_err() {
            break;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn scan_dir(
    dir_path: &Path,
    depth: u32,
    max_depth: u32,
    visited: &mut HashSet<PathBuf>,
    buffer: &mut Vec<PathBuf>,
    sender: &Sender<PathBuf>,
    ctx: &ScanContext<'_>,
) {
    if depth > max_depth {
        log::warn!("max recursion depth exceeded at: {}", dir_path.display());
        return;
    }

    let canonical = std::fs::canonicalize(dir_path).unwrap_or_else(|_| dir_path.to_path_buf());
    if !visited.insert(canonical) {
        return;
    }

    let entries = match std::fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(source) => {
            log::warn!(
                "{}",
                crate::error::FfcError::DirOpen {
                    path: dir_path.to_path_buf(),
                    source,
                }
            );
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("error reading entry in {}: {e}", dir_path.display());
                continue;
            }
        };
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let path = entry.path();

        if should_skip_entry(&name, &path, ctx) {
            continue;
        }

        // `DirEntry::file_type` does not follow symlinks, which would silently
        // drop every symlinked directory from the walk (neither recursed into
        // nor queued). `fs::metadata` follows symlinks the way the stat-based
        // classification this is grounded on does; the canonical-path visited
        // set above is what actually guards against the symlink-loop this
        // then exposes us to.
        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(source) => {
                log::warn!(
                    "{}",
                    crate::error::FfcError::FileStat {
                        path: path.clone(),
                        source,
                    }
                );
                continue;
            }
        };

        if metadata.is_dir() {
            scan_dir(&path, depth + 1, max_depth, visited, buffer, sender, ctx);
        } else if metadata.is_file() {
            buffer.push(path);
            if buffer.len() >= QUEUE_BUFFER_SIZE {
                flush_buffer(buffer, sender);
            }
        }
    }
}

/// Spawn the scanner thread. Returns the number of files enqueued once the
/// walk completes and marks `queue` as done so consumers can stop waiting.
/// `sender` should be the queue's only remaining `Sender` clone belonging to
/// the scan side — dropping it when the walk finishes is what lets workers
/// detect end-of-input once the channel drains.
pub fn spawn_scanner(
    config: &RunConfig,
    sender: Sender<PathBuf>,
    scanning_done: super::queue::ScanningDone,
) -> JoinHandle<usize> {
    let roots = config.roots.clone();
    let max_depth = config.max_recursion_depth;
    let exclude_hidden = config.exclude_hidden;
    let excluded_dirs = config.exclude_directories.clone();
    let excluded_exts = config.exclude_extensions.clone();

    thread::spawn(move || {
        let mut visited = HashSet::new();
        let mut buffer = Vec::with_capacity(QUEUE_BUFFER_SIZE);
        let ctx = ScanContext {
            exclude_hidden,
            excluded_dirs: &excluded_dirs,
            excluded_exts: &excluded_exts,
        };

        let mut count = 0usize;
        for root in &roots {
            let before = buffer.len();
            scan_dir(root, 0, max_depth, &mut visited, &mut buffer, &sender, &ctx);
            count += buffer.len().saturating_sub(before);
        }
        if !buffer.is_empty() {
            count += buffer.len();
            flush_buffer(&mut buffer, &sender);
        }

        scanning_done.mark();
        drop(sender);
        count
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet as Set;

    fn ctx(exclude_hidden: bool, dirs: &Set<PathBuf>, exts: &Set<String>) -> ScanContext<'_> {
        ScanContext {
            exclude_hidden,
            excluded_dirs: dirs,
            excluded_exts: exts,
        }
    }

    #[test]
    fn hidden_entries_are_skipped_when_configured() {
        let dirs = Set::new();
        let exts = Set::new();
        let c = ctx(true, &dirs, &exts);
        assert!(should_skip_entry(".hidden", Path::new("/a/.hidden"), &c));
        assert!(!should_skip_entry("visible", Path::new("/a/visible"), &c));
    }

    #[test]
    fn excluded_directory_is_skipped_by_exact_path() {
        let mut dirs = Set::new();
        dirs.insert(PathBuf::from("/a/skip"));
        let exts = Set::new();
        let c = ctx(false, &dirs, &exts);
        assert!(should_skip_entry("skip", Path::new("/a/skip"), &c));
    }

    #[test]
    fn excluded_extension_is_skipped() {
        let dirs = Set::new();
        let mut exts = Set::new();
        exts.insert(".tmp".to_string());
        let c = ctx(false, &dirs, &exts);
        assert!(should_skip_entry("file.tmp", Path::new("/a/file.tmp"), &c));
        assert!(!should_skip_entry("file.txt", Path::new("/a/file.txt"), &c));
    }

    #[test]
    fn scan_finds_files_and_respects_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::write(dir.path().join("top.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("a/mid.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("a/b/c/deep.txt"), b"x").unwrap();

        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut visited = HashSet::new();
        let mut buffer = Vec::new();
        let dirs = Set::new();
        let exts = Set::new();
        let c = ctx(false, &dirs, &exts);
        scan_dir(dir.path(), 0, 10, &mut visited, &mut buffer, &sender, &c);
        flush_buffer(&mut buffer, &sender);
        drop(sender);

        let found: Vec<PathBuf> = receiver.iter().collect();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn visited_set_prevents_revisiting_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), b"x").unwrap();

        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut visited = HashSet::new();
        let mut buffer = Vec::new();
        let dirs = Set::new();
        let exts = Set::new();
        let c = ctx(false, &dirs, &exts);
        scan_dir(dir.path(), 0, 10, &mut visited, &mut buffer, &sender, &c);
        // Second call on the same directory is a no-op because it's already visited.
        scan_dir(dir.path(), 0, 10, &mut visited, &mut buffer, &sender, &c);
        flush_buffer(&mut buffer, &sender);
        drop(sender);

        let found: Vec<PathBuf> = receiver.iter().collect();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn symlink_cycle_terminates_and_does_not_duplicate_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/f.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("a/b/g.txt"), b"x").unwrap();
        // `a/b/loop` links back to `a`, so naive recursion would traverse
        // a -> b -> loop -> a -> b -> loop -> ... forever.
        std::os::unix::fs::symlink(dir.path().join("a"), dir.path().join("a/b/loop")).unwrap();

        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut visited = HashSet::new();
        let mut buffer = Vec::new();
        let dirs = Set::new();
        let exts = Set::new();
        let c = ctx(false, &dirs, &exts);
        scan_dir(dir.path(), 0, 64, &mut visited, &mut buffer, &sender, &c);
        flush_buffer(&mut buffer, &sender);
        drop(sender);

        let found: Vec<PathBuf> = receiver.iter().collect();
        assert_eq!(found.len(), 2);
        let unique: HashSet<_> = found.iter().collect();
        assert_eq!(unique.len(), found.len());
    }
}
