use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::context::RequestContext;
use crate::executor::{SingleWorkerExecutor, WorkUnit, WorkUnitInfo};
use crate::observer::LifecycleObserver;
use crate::{Error, Result};

/// Deadline applied to a dispatched unit unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(85_000);

/// How a dispatched unit ended, as seen by the waiting request.
#[derive(Debug)]
pub enum DispatchOutcome<T> {
    Completed(T),
    TimedOut,
    Failed(Error),
}

impl<T> DispatchOutcome<T> {
    /// Converts the outcome into a `Result`, reporting a timeout as `Error::Timeout(deadline)`.
    pub fn into_result(self, deadline: Duration) -> Result<T> {
        match self {
            DispatchOutcome::Completed(value) => Ok(value),
            DispatchOutcome::TimedOut => Err(Error::Timeout(deadline)),
            DispatchOutcome::Failed(err) => Err(err),
        }
    }
}

/// Bridges a request to the single worker and back.
///
/// The waiting request only holds an async task, never a runtime thread.
/// A timeout stops the wait but does not interrupt the unit, which keeps the
/// worker busy until it returns.
#[derive(Clone)]
pub struct DispatchGateway {
    executor: Arc<SingleWorkerExecutor>,
    observer: Arc<dyn LifecycleObserver>,
    timeout: Duration,
}

impl DispatchGateway {
    pub fn new(
        executor: Arc<SingleWorkerExecutor>,
        observer: Arc<dyn LifecycleObserver>,
        timeout: Duration,
    ) -> Self {
        Self {
            executor,
            observer,
            timeout,
        }
    }

    pub fn executor(&self) -> &Arc<SingleWorkerExecutor> {
        &self.executor
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Submits `unit` and waits for its outcome, firing the observer hooks.
    ///
    /// Returns `Err(Error::ShutdownInProgress)` without firing any hook when
    /// the executor no longer accepts work. Otherwise exactly one outcome is
    /// produced; a result that is ready when the deadline fires wins over the
    /// timeout, and anything arriving later is dropped.
    pub async fn dispatch<T>(&self, ctx: &RequestContext, unit: WorkUnit<T>) -> Result<DispatchOutcome<T>>
    where
        T: Send + 'static,
    {
        let deadline = Instant::now() + self.timeout;
        let mut handle = self.executor.submit(unit)?;
        let info = *handle.info();

        self.observer.before_concurrent_handling(ctx, &info);
        let guard = CompletionGuard::new(self.observer.as_ref(), ctx, info);
        tracing::trace!(
            "Dispatched unit {} for {}, {} ahead in queue",
            info.id,
            ctx,
            self.executor.pending().saturating_sub(1)
        );

        // `timeout_at` polls the inner future before the timer
        let started = timeout_at(deadline, handle.started()).await;
        let outcome = match started {
            Err(_) => DispatchOutcome::TimedOut,
            Ok(Err(err)) => DispatchOutcome::Failed(err),
            Ok(Ok(started_at)) => {
                self.observer.pre_process(ctx, &info);

                match timeout_at(deadline, handle.join()).await {
                    Err(_) => DispatchOutcome::TimedOut,
                    Ok(result) => {
                        self.observer.post_process(ctx, &info, started_at.elapsed());
                        match result {
                            Ok(value) => DispatchOutcome::Completed(value),
                            Err(err) => DispatchOutcome::Failed(err),
                        }
                    }
                }
            }
        };

        match &outcome {
            DispatchOutcome::TimedOut => self.observer.timeout(ctx, &info),
            DispatchOutcome::Failed(err) => self.observer.error(ctx, &info, err),
            DispatchOutcome::Completed(_) => {}
        }
        guard.complete();

        Ok(outcome)
    }
}

/// Fires `after_completion` once the request leaves the gateway.
///
/// If the dispatch future is dropped before an outcome exists (the client
/// went away), `error` fires with [`Error::Cancelled`] first.
struct CompletionGuard<'a> {
    observer: &'a dyn LifecycleObserver,
    ctx: &'a RequestContext,
    info: WorkUnitInfo,
    completed: bool,
}

impl<'a> CompletionGuard<'a> {
    fn new(observer: &'a dyn LifecycleObserver, ctx: &'a RequestContext, info: WorkUnitInfo) -> Self {
        Self {
            observer,
            ctx,
            info,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
        self.observer.after_completion(self.ctx, &self.info);
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::debug!("Dispatch of unit {} for {} dropped before an outcome", self.info.id, self.ctx);
            self.observer.error(self.ctx, &self.info, &Error::Cancelled);
            self.observer.after_completion(self.ctx, &self.info);
        }
    }
}
