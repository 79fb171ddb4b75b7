//! Metrics middleware for resource requests.
//!
//! Wraps each request in a `tracing` span and records request counts and
//! latency through the `metrics` facade. Without an installed recorder the
//! `metrics` calls are no-ops.

use std::task::{Context, Poll};
use std::time::Instant;

use axum::response::Response;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use super::StageFuture;
use crate::service::error::ApiError;
use crate::service::request::ResourceRequest;

pub const REQUESTS_TOTAL: &str = "atrium_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "atrium_request_duration_seconds";

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records request duration and outcome.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<ResourceRequest> for MetricsService<S>
where
    S: Service<ResourceRequest, Response = Response, Error = ApiError> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = ApiError;
    type Future = StageFuture<ApiError>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: ResourceRequest) -> Self::Future {
        let route = request.route_name();
        let span = info_span!(
            "resource_request",
            route = route,
            method = %request.method(),
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();

                let outcome = match &result {
                    Ok(response) if response.status().is_server_error() => "server_error",
                    Ok(response) if response.status().is_client_error() => "client_error",
                    Ok(_) => "ok",
                    Err(error) => error.kind(),
                };

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                let span = tracing::Span::current();
                span.record("duration_ms", duration_ms);
                span.record("outcome", outcome);

                metrics::counter!(REQUESTS_TOTAL, "route" => route, "outcome" => outcome)
                    .increment(1);
                metrics::histogram!(REQUEST_DURATION_SECONDS, "route" => route)
                    .record(elapsed.as_secs_f64());

                tracing::debug!(route, duration_ms, outcome, "request complete");

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use http::{Method, StatusCode, Uri};
    use tower::ServiceExt;

    use super::*;
    use crate::service::router::{handler_fn, ResourceRouter};

    fn request(route: &'static str) -> ResourceRequest {
        ResourceRequest::new(route, Method::GET, Uri::from_static("/"))
    }

    #[tokio::test]
    async fn passes_response_through() {
        let router = ResourceRouter::new().with(
            "ok",
            handler_fn(|_req| async { Ok::<_, ApiError>(StatusCode::ACCEPTED.into_response()) }),
        );
        let response = MetricsLayer.layer(router).oneshot(request("ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn passes_error_through() {
        let router = ResourceRouter::new().with(
            "missing",
            handler_fn(|_req| async { Err::<Response, _>(ApiError::NotFound("label".into())) }),
        );
        let err = MetricsLayer.layer(router).oneshot(request("missing")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
