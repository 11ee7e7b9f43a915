pub mod config;
mod init;
pub mod interceptor;
pub mod routes;
mod state;
pub mod utils;

pub use init::init_router;
pub use state::ServerState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Dispatch(#[from] executorobs::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        use executorobs::Error::*;

        match self {
            ServerError::Dispatch(err) => match err {
                Timeout(_) => StatusCode::GATEWAY_TIMEOUT.into_response(),
                ShutdownInProgress | Abandoned => StatusCode::SERVICE_UNAVAILABLE.into_response(),
                WorkerFailure(_) | Cancelled | IO(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            },
        }
    }
}
