use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info_span, Span};

use crate::server::interceptor::{intercept, InboundInterceptor};
use crate::server::routes::{cluster, default};
use crate::server::state::ServerState;

/// Slack on top of the dispatch deadline before the HTTP layer gives up.
const TIMEOUT_BACKSTOP: Duration = Duration::from_secs(5);

pub fn init_router(state: Arc<ServerState>, interceptor: Arc<dyn InboundInterceptor>) -> Router {
    let request_timeout = state.config.request_timeout() + TIMEOUT_BACKSTOP;

    Router::new()
        .route("/api/cluster/info", get(cluster::cluster_info))
        .route("/health", get(default::health_check))
        .with_state(state)
        .layer(middleware::from_fn_with_state(interceptor, intercept))
        .layer((
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    // Log the matched route's path (with placeholders not filled in).
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str);
                    tracing::debug!("{}", request.uri());

                    info_span!(
                        "http_request",
                        method = ?request.method(),
                        matched_path,
                        status = tracing::field::Empty,
                    )
                })
                .on_response(|response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    tracing::debug!("Responded in {} ms", latency.as_millis());
                }),
            TimeoutLayer::new(request_timeout),
        ))
}
