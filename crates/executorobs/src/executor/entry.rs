use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tokio::sync::oneshot;

use crate::executor::unit::{WorkUnit, WorkUnitInfo};
use crate::{Error, Result};

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Queue entry
pub(crate) struct QueueEntry {
    /// Identity of the unit
    pub info: WorkUnitInfo,

    /// Type-erased computation, sends its own result when run
    pub job: Job,

    /// Signals the dispatch side that the unit left the queue
    pub started_tx: oneshot::Sender<Instant>,

    /// Instant when this entry was queued
    pub queue_time: Instant,
}

impl QueueEntry {
    pub fn new<T>(unit: WorkUnit<T>) -> (Self, TaskHandle<T>)
    where
        T: Send + 'static,
    {
        let (started_tx, started_rx) = oneshot::channel();
        let (result_tx, result_rx) = oneshot::channel();
        let (info, op) = unit.into_parts();
        let id = info.id;

        let job: Job = Box::new(move || {
            let result = match panic::catch_unwind(AssertUnwindSafe(op)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(Error::WorkerFailure(format!("{err:#}"))),
                Err(payload) => Err(Error::WorkerFailure(panic_message(payload))),
            };

            if result_tx.send(result).is_ok() {
                tracing::trace!("Successfully sent result for work unit {}", id)
            } else {
                tracing::debug!("Caller of work unit {} stopped waiting, result dropped", id)
            }
        });

        let entry = Self {
            info,
            job,
            started_tx,
            queue_time: Instant::now(),
        };
        let handle = TaskHandle {
            info,
            started_rx,
            result_rx,
        };
        (entry, handle)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Dispatch-side end of a submitted work unit.
///
/// Both signals resolve to [`Error::Abandoned`] when the executor drops the
/// unit without running it.
#[derive(Debug)]
pub struct TaskHandle<T> {
    info: WorkUnitInfo,
    started_rx: oneshot::Receiver<Instant>,
    result_rx: oneshot::Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    pub fn info(&self) -> &WorkUnitInfo {
        &self.info
    }

    /// Waits until the worker dequeues the unit. Must not be awaited again
    /// once it has returned.
    pub async fn started(&mut self) -> Result<Instant> {
        (&mut self.started_rx).await.map_err(|_| Error::Abandoned)
    }

    /// Waits for the unit's result.
    pub async fn join(self) -> Result<T> {
        self.result_rx.await.map_err(|_| Error::Abandoned)?
    }

    /// Blocking variant of [`TaskHandle::join`] for callers outside the async runtime.
    pub fn blocking_join(self) -> Result<T> {
        self.result_rx.blocking_recv().map_err(|_| Error::Abandoned)?
    }
}
