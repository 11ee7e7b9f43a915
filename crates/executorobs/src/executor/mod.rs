pub(crate) mod entry;
pub mod unit;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use entry::TaskHandle;
pub use unit::{UnitId, WorkUnit, WorkUnitInfo};

use crate::executor::entry::QueueEntry;
use crate::{Error, Result};

/// Thread name prefix of the worker, followed by its index.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "test-";

/// Queue command
enum Command {
    Append(QueueEntry),
    Stop,
}

/// Result of [`SingleWorkerExecutor::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum DrainStatus {
    /// Queue drained and worker stopped within the grace period
    Drained,
    /// Grace period elapsed; `pending` queued units were discarded
    TimedOut { pending: usize },
}

/// FIFO queue served by exactly one dedicated OS thread.
///
/// Units run strictly one at a time in submission order. The queue is
/// unbounded, so a slow unit holds back everything submitted after it.
pub struct SingleWorkerExecutor {
    tx: Sender<Command>,
    accepting: AtomicBool,
    abandoned: Arc<AtomicBool>,
    done_rx: Receiver<()>,
    thread_name: String,
}

impl SingleWorkerExecutor {
    pub fn new(thread_name_prefix: &str) -> Result<Self> {
        // Create channels
        let (tx, rx) = channel::unbounded();
        let (done_tx, done_rx) = channel::bounded::<()>(0);

        let abandoned = Arc::new(AtomicBool::new(false));
        let thread_name = format!("{thread_name_prefix}1");

        let worker_abandoned = abandoned.clone();
        let _join_handle = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                run_worker(rx, worker_abandoned);
                // Disconnecting tells `shutdown` the worker is gone
                drop(done_tx);
            })?;

        tracing::debug!("Started worker thread {}", thread_name);

        Ok(Self {
            tx,
            accepting: AtomicBool::new(true),
            abandoned,
            done_rx,
            thread_name,
        })
    }

    /// Enqueues a unit and returns immediately.
    pub fn submit<T>(&self, unit: WorkUnit<T>) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
    {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(Error::ShutdownInProgress);
        }

        let (entry, handle) = QueueEntry::new(unit);
        tracing::trace!("Queueing work unit {}", entry.info.id);

        self.tx
            .send(Command::Append(entry))
            .map_err(|_| Error::ShutdownInProgress)?;

        Ok(handle)
    }

    /// Stops accepting work and waits up to `max_wait` for the queue to drain.
    ///
    /// Units still queued when `max_wait` elapses are discarded. A unit that
    /// is already running keeps the detached worker thread until it returns.
    /// Calling this again only waits for the worker to finish.
    pub fn shutdown(&self, max_wait: Duration) -> DrainStatus {
        if self
            .accepting
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::info!(
                "Shutting down executor {}, {} unit(s) queued",
                self.thread_name,
                self.pending()
            );
            // Queued before Stop, so everything accepted so far still runs
            if self.tx.send(Command::Stop).is_err() {
                tracing::warn!("Worker {} already exited", self.thread_name);
            }
        }

        match self.done_rx.recv_timeout(max_wait) {
            Err(RecvTimeoutError::Timeout) => {
                let pending = self.pending().saturating_sub(1);
                self.abandoned.store(true, Ordering::Release);
                tracing::warn!(
                    "Executor {} did not drain within {:?}, discarding {} queued unit(s)",
                    self.thread_name,
                    max_wait,
                    pending
                );
                DrainStatus::TimedOut { pending }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Executor {} drained", self.thread_name);
                DrainStatus::Drained
            }
        }
    }

    /// Number of commands waiting in the queue, excluding the running unit.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }
}

fn run_worker(rx: Receiver<Command>, abandoned: Arc<AtomicBool>) {
    'main: while let Ok(cmd) = rx.recv() {
        use Command::*;

        match cmd {
            Append(entry) => {
                if abandoned.load(Ordering::Acquire) {
                    tracing::debug!("Discarding work unit {}", entry.info.id);
                    continue;
                }

                tracing::trace!(
                    "Processing work unit {}, queued {}ms ago",
                    entry.info.id,
                    entry.queue_time.elapsed().as_millis()
                );

                // A dropped receiver means the caller already gave up; run anyway
                let _ = entry.started_tx.send(std::time::Instant::now());
                (entry.job)();
            }
            Stop => {
                tracing::info!("Stopping worker");
                break 'main;
            }
        }
    }
}
