//! # `executorobs`
//!
//! Runs request work on a single dedicated worker thread and hands the result
//! back to an async caller, with a deadline and observable lifecycle.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use executorobs::{DispatchGateway, DispatchOutcome, RequestContext, SingleWorkerExecutor, TracingObserver, WorkUnit};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> executorobs::Result<()> {
//! let executor = Arc::new(SingleWorkerExecutor::new("worker-")?);
//! let gateway = DispatchGateway::new(executor, Arc::new(TracingObserver), Duration::from_secs(1));
//!
//! let ctx = RequestContext::new("GET", "/api/cluster/info");
//! let outcome = gateway.dispatch(&ctx, WorkUnit::new(|| Ok("Hello async"))).await?;
//!
//! assert!(matches!(outcome, DispatchOutcome::Completed("Hello async")));
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! - [`SingleWorkerExecutor`]: unbounded FIFO queue, one worker, bounded drain on shutdown
//! - [`DispatchGateway`]: submits a unit and waits for completion, timeout or failure
//! - [`LifecycleObserver`]: hooks fired at each phase of a dispatched request

pub mod context;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod observer;

pub use context::RequestContext;
pub use error::{Error, Result};
pub use executor::{DrainStatus, SingleWorkerExecutor, TaskHandle, UnitId, WorkUnit, WorkUnitInfo};
pub use gateway::{DispatchGateway, DispatchOutcome, DEFAULT_TIMEOUT};
pub use observer::{LifecycleObserver, NoopObserver, TracingObserver};
