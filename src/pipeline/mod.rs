//! Pipeline components: bounded file queue, directory scanner, dispatcher,
//! and worker pool.

pub mod dispatcher;
pub mod queue;
pub mod scanner;

pub use dispatcher::{spawn_dispatcher, spawn_workers};
pub use queue::{queue_capacity, FileQueue, ScanningDone};
pub use scanner::spawn_scanner;
