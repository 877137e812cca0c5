//! Idle background task owned by the registry.
//!
//! The worker does no bus work yet. It exists so periodic jobs have a home
//! and so the thread layout matches deployments that already account for it.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::info;

pub const WORKER_NAME: &str = "max6675";
pub const WORKER_PERIOD: Duration = Duration::from_millis(1);
pub const WORKER_STACK_SIZE: usize = 64 * 1024;

/// Starts the worker for [`Max6675Registry::setup`](crate::registry::Max6675Registry::setup).
pub type WorkerSpawner = fn(&str, Duration) -> io::Result<BackgroundWorker>;

pub struct BackgroundWorker {
    name: String,
    ticks: Arc<AtomicU64>,
    // Never joined; the loop runs for the life of the process.
    handle: JoinHandle<()>,
}

impl BackgroundWorker {
    /// Start the loop on a dedicated thread. Each iteration sleeps `period`.
    pub fn spawn(name: &str, period: Duration) -> io::Result<Self> {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || loop {
                thread::sleep(period);
                counter.fetch_add(1, Ordering::Relaxed);
            })?;

        info!("[worker] {} started, period {:?}", name, period);
        Ok(Self {
            name: name.to_string(),
            ticks,
            handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loop iterations completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
