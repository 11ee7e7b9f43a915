use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Deadline of {0:?} exceeded while waiting for the worker")]
    Timeout(Duration),

    #[error("Work unit failed: {0}")]
    WorkerFailure(String),

    #[error("Executor is shutting down")]
    ShutdownInProgress,

    #[error("Work unit abandoned by the executor")]
    Abandoned,

    #[error("Caller stopped waiting before an outcome")]
    Cancelled,

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
