use anyhow::{Context, Result};
use std::sync::Arc;

use executorobs::{DispatchGateway, LifecycleObserver, SingleWorkerExecutor, TracingObserver};

use crate::server::config::Config;

/// Represents the state of the server.
#[derive(Clone)]
pub struct ServerState {
    pub gateway: DispatchGateway,
    pub config: Config,
}

impl ServerState {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    pub fn with_observer(config: Config, observer: Arc<dyn LifecycleObserver>) -> Result<Self> {
        config.validate()?;

        let executor = SingleWorkerExecutor::new(&config.thread_name_prefix)
            .context("Failed to start worker thread")?;
        let gateway = DispatchGateway::new(Arc::new(executor), observer, config.request_timeout());

        Ok(Self { gateway, config })
    }

    pub fn executor(&self) -> &Arc<SingleWorkerExecutor> {
        self.gateway.executor()
    }
}
