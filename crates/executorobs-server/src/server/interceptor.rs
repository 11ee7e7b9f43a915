use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use executorobs::RequestContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Decision taken before a request reaches its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Reject(StatusCode),
}

/// Gate invoked once for every inbound request.
pub trait InboundInterceptor: Send + Sync + 'static {
    fn pre_handle(&self, request: &Request) -> Verdict;
}

/// Logs each request and lets it through.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInterceptor;

impl InboundInterceptor for LoggingInterceptor {
    fn pre_handle(&self, request: &Request) -> Verdict {
        tracing::info!("Pre-handle {} {}", request.method(), request.uri());
        Verdict::Continue
    }
}

/// Middleware running the interceptor and attaching a [`RequestContext`].
///
/// The request id is always fresh. An `x-request-id` header is only carried
/// along as the correlation id.
pub async fn intercept(
    State(interceptor): State<Arc<dyn InboundInterceptor>>,
    mut request: Request,
    next: Next,
) -> Response {
    match interceptor.pre_handle(&request) {
        Verdict::Continue => {
            let mut ctx = RequestContext::new(request.method().as_str(), request.uri().path());
            if let Some(correlation_id) = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
            {
                ctx = ctx.with_correlation_id(correlation_id);
            }
            request.extensions_mut().insert(ctx);

            next.run(request).await
        }
        Verdict::Reject(status) => {
            tracing::debug!("Rejected {} {} with {}", request.method(), request.uri(), status);
            status.into_response()
        }
    }
}
