//! Top-level orchestration: wires scanner → queue → dispatcher → worker
//! pool → per-file handler → store + summary, runs the reconciliation pass,
//! then prints the summary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::handler;
use crate::pipeline::{queue::ScanningDone, FileQueue};
use crate::reconcile;
use crate::store::Store;
use crate::summary::Summary;
use crate::types::RunConfig;

/// Cooperative cancellation: set by the Ctrl+C handler, polled by the
/// dispatcher's final drain and nowhere else — an in-flight write
/// transaction always runs to commit or abort before a worker notices.
pub fn install_cancel_handler() -> Result<Arc<AtomicBool>> {
    let cancel_requested = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .map_err(|e| crate::error::FfcError::ThreadPool(format!("failed to install Ctrl+C handler: {e}")))?;
    Ok(cancel_requested)
}

/// Run one full pass: populate, verify, or reconcile, per `config.mode`.
pub fn run(config: &RunConfig, cancel_requested: &Arc<AtomicBool>) -> Result<()> {
    let store = Store::open(
        &config.store_path,
        config.store_max_bytes,
        (config.worker_count + 4) as u32,
        config.durability,
    )?;
    let summary = Arc::new(Summary::new());

    let file_queue = FileQueue::new(config.total_memory_budget);
    let scanning_done = ScanningDone::default();
    let (task_tx, task_rx) = crossbeam_channel::bounded(file_queue.receiver.capacity().unwrap_or(1));

    let scanner_handle =
        crate::pipeline::spawn_scanner(config, file_queue.sender.clone(), scanning_done.clone());
    drop(file_queue.sender);

    let dispatcher_handle =
        crate::pipeline::spawn_dispatcher(file_queue.receiver, scanning_done, task_tx);

    let mode = config.mode;
    let per_worker_budget = config.per_worker_budget;
    let store = Arc::new(store);
    let worker_handles = crate::pipeline::spawn_workers(config.worker_count, task_rx, {
        let store = Arc::clone(&store);
        let summary = Arc::clone(&summary);
        move |path| handler::handle_file(&path, mode, &store, per_worker_budget, &summary)
    });

    scanner_handle.join().map_err(|_| {
        crate::error::FfcError::ThreadPool("scanner thread panicked".to_string())
    })?;
    dispatcher_handle.join().map_err(|_| {
        crate::error::FfcError::ThreadPool("dispatcher thread panicked".to_string())
    })?;
    for h in worker_handles {
        let _ = h.join();
    }

    if cancel_requested.load(Ordering::Relaxed) {
        log::warn!("cancellation requested; skipping reconciliation pass and summary commit");
        return Ok(());
    }

    reconcile::run(&store, config.mode, &summary);
    summary.print(config.mode);
    Ok(())
}
