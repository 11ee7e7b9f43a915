use std::time::Duration;

use crate::context::RequestContext;
use crate::executor::WorkUnitInfo;
use crate::Error;

/// Hooks fired by the dispatch gateway at each phase of an async request.
///
/// Hooks run on the dispatching task, never on the worker thread, and each
/// fires at most once per request. They are for side effects only and should
/// return quickly: a slow hook delays that request's response.
pub trait LifecycleObserver: Send + Sync + 'static {
    /// The unit was accepted by the executor.
    fn before_concurrent_handling(&self, _ctx: &RequestContext, _unit: &WorkUnitInfo) {}

    /// The worker dequeued the unit.
    fn pre_process(&self, _ctx: &RequestContext, _unit: &WorkUnitInfo) {}

    /// The unit returned, successfully or not, before the deadline.
    fn post_process(&self, _ctx: &RequestContext, _unit: &WorkUnitInfo, _elapsed: Duration) {}

    /// The deadline passed before a result arrived.
    fn timeout(&self, _ctx: &RequestContext, _unit: &WorkUnitInfo) {}

    /// The unit failed or was abandoned.
    fn error(&self, _ctx: &RequestContext, _unit: &WorkUnitInfo, _cause: &Error) {}

    /// Terminal hook, fires on every path.
    fn after_completion(&self, _ctx: &RequestContext, _unit: &WorkUnitInfo) {}
}

/// Observer that ignores every phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {}

/// Observer logging every phase through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LifecycleObserver for TracingObserver {
    fn before_concurrent_handling(&self, ctx: &RequestContext, unit: &WorkUnitInfo) {
        match &ctx.correlation_id {
            Some(correlation_id) => {
                tracing::info!("Submitted {}: unit {}, correlation {}", ctx, unit.id, correlation_id)
            }
            None => tracing::info!("Submitted {}: unit {}", ctx, unit.id),
        }
    }

    fn pre_process(&self, ctx: &RequestContext, unit: &WorkUnitInfo) {
        tracing::info!(
            "Started {}: unit {}, waited {}ms",
            ctx,
            unit.id,
            unit.created_at.elapsed().as_millis()
        );
    }

    fn post_process(&self, ctx: &RequestContext, unit: &WorkUnitInfo, elapsed: Duration) {
        tracing::info!("Finished {}: unit {}, ran {}ms", ctx, unit.id, elapsed.as_millis());
    }

    fn timeout(&self, ctx: &RequestContext, unit: &WorkUnitInfo) {
        tracing::info!("Timed out {}: unit {}", ctx, unit.id);
    }

    fn error(&self, ctx: &RequestContext, unit: &WorkUnitInfo, cause: &Error) {
        tracing::warn!("Failed {}: unit {}: {}", ctx, unit.id, cause);
    }

    fn after_completion(&self, ctx: &RequestContext, unit: &WorkUnitInfo) {
        tracing::info!("Done {}: unit {}", ctx, unit.id);
    }
}
