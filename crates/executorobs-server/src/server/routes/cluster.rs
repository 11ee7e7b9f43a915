use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use std::sync::Arc;
use tokio::time::Instant;

use executorobs::{DispatchOutcome, RequestContext, WorkUnit};

use crate::server::state::ServerState;
use crate::server::ServerError;

pub const CLUSTER_INFO: &str = "Hello async";

pub async fn cluster_info(
    State(server_state): State<Arc<ServerState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Response, ServerError> {
    let start = Instant::now();

    let unit = WorkUnit::with_id(ctx.id, || Ok(CLUSTER_INFO.to_string()));
    let outcome = server_state.gateway.dispatch(&ctx, unit).await?;

    let duration = Instant::now() - start;
    tracing::trace!("Dispatch took {} ms", duration.as_millis());

    respond(&server_state, outcome)
}

/// Maps a dispatch outcome to the response, written exactly once by the caller.
fn respond(server_state: &ServerState, outcome: DispatchOutcome<String>) -> Result<Response, ServerError> {
    match outcome {
        DispatchOutcome::Completed(body) => Ok((StatusCode::OK, body).into_response()),
        // Shutdown stays visible in both modes
        DispatchOutcome::Failed(executorobs::Error::Abandoned) => {
            Err(executorobs::Error::Abandoned.into())
        }
        // Legacy mode swallows timeouts and failures into an empty 200
        _ if server_state.config.legacy_empty_response => Ok(StatusCode::OK.into_response()),
        DispatchOutcome::TimedOut => {
            Err(executorobs::Error::Timeout(server_state.gateway.timeout()).into())
        }
        DispatchOutcome::Failed(err) => Err(err.into()),
    }
}
