//! Bounded file queue: a `crossbeam_channel` sized against the memory
//! budget, plus a `scanning_done` flag so consumers can distinguish "empty
//! for now" from "empty forever".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

/// Conservative average path length used to translate a byte budget into a
/// queue depth (paths, not bytes, are what's queued).
const AVERAGE_PATH_LENGTH: u64 = 256;
/// Fraction of the total memory budget set aside for the queue.
const MEMORY_FACTOR: u64 = 10;

/// Queue capacity for `total_memory_budget` bytes, clamped to fit `i32`
/// (mirrors the original C queue's `gint max_size`, which this is sized to
/// approximate even though crossbeam's channel itself takes a `usize`).
pub fn queue_capacity(total_memory_budget: u64) -> usize {
    let calculated = (total_memory_budget / MEMORY_FACTOR) / AVERAGE_PATH_LENGTH;
    calculated.min(i32::MAX as u64) as usize
}

/// Marker shared between the scanner and anything that wants to know
/// "finished walking" independent of the channel's own closed state (the
/// channel only closes once every `Sender` clone handed to workers is also
/// dropped, which happens later than the scan itself finishing).
#[derive(Clone, Default)]
pub struct ScanningDone(Arc<AtomicBool>);

impl ScanningDone {
    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A sender/receiver pair sized against the memory budget, plus the
/// `scanning_done` marker. The queue itself holds no clone of either end:
/// once the scanner drops its `Sender` and every worker drains the channel,
/// `Receiver::recv` reports disconnection and worker loops exit on their own.
pub struct FileQueue {
    pub sender: Sender<std::path::PathBuf>,
    pub receiver: Receiver<std::path::PathBuf>,
    pub scanning_done: ScanningDone,
}

impl FileQueue {
    pub fn new(total_memory_budget: u64) -> FileQueue {
        let (sender, receiver) = bounded(queue_capacity(total_memory_budget).max(1));
        FileQueue {
            sender,
            receiver,
            scanning_done: ScanningDone::default(),
        }
    }
}
