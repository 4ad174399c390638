//! Dispatcher and worker pool: the dispatcher drains the scanner's bounded
//! queue into a worker task channel; workers pull from that channel and run
//! the per-file handler.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::queue::ScanningDone;

/// How long the dispatcher sleeps between empty polls of the file queue.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Single-threaded loop: try_pop the file queue, hand each path to the
/// worker pool. Exits once the scanner is done and the queue is drained.
pub fn spawn_dispatcher(
    file_rx: Receiver<PathBuf>,
    scanning_done: ScanningDone,
    task_tx: Sender<PathBuf>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match file_rx.try_recv() {
            Ok(path) => {
                if task_tx.send(path).is_err() {
                    break;
                }
            }
            Err(TryRecvError::Empty) => {
                if scanning_done.get() {
                    // Final drain: anything that arrived between the check above
                    // and `scanning_done` being set is still in the channel.
                    while let Ok(path) = file_rx.try_recv() {
                        if task_tx.send(path).is_err() {
                            break;
                        }
                    }
                    break;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(TryRecvError::Disconnected) => break,
        }
    })
}

/// Spawn `worker_count` threads, each pulling paths from `task_rx` and
/// running `handler` until the channel disconnects (dispatcher exited and
/// every other worker's clone of `task_rx` has drained).
pub fn spawn_workers<F>(worker_count: usize, task_rx: Receiver<PathBuf>, handler: F) -> Vec<JoinHandle<()>>
where
    F: Fn(PathBuf) + Send + Sync + 'static,
{
    let handler = std::sync::Arc::new(handler);
    (0..worker_count.max(1))
        .map(|_| {
            let rx = task_rx.clone();
            let handler = std::sync::Arc::clone(&handler);
            thread::spawn(move || {
                for path in rx.iter() {
                    handler(path);
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::ScanningDone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn dispatcher_forwards_paths_and_exits_when_drained() {
        let (file_tx, file_rx) = crossbeam_channel::unbounded::<PathBuf>();
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<PathBuf>();
        let scanning_done = ScanningDone::default();

        file_tx.send(PathBuf::from("/a")).unwrap();
        file_tx.send(PathBuf::from("/b")).unwrap();
        scanning_done.mark();
        drop(file_tx);

        let handle = spawn_dispatcher(file_rx, scanning_done, task_tx);
        handle.join().unwrap();

        let got: Vec<PathBuf> = task_rx.try_iter().collect();
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn workers_process_every_submitted_path() {
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<PathBuf>();
        let processed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&processed);

        let handles = spawn_workers(4, task_rx, move |_path| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        for i in 0..50 {
            task_tx.send(PathBuf::from(format!("/file-{i}"))).unwrap();
        }
        drop(task_tx);

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(processed.load(Ordering::SeqCst), 50);
    }
}
