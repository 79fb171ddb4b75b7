//! Error boundary: the outermost stage of the dispatch pipeline.
//!
//! Whatever happens further in (an `ApiError`, a failed readiness check, a
//! panic in a handler), the boundary answers with exactly one structured
//! response. Its error type is `Infallible`.

use std::convert::Infallible;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::task::{Context, Poll};

use atrium_core::ExceptionLogger;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use tower::{Layer, Service};

use super::StageFuture;
use crate::service::classify::classify_guarded;
use crate::service::error::ApiError;
use crate::service::request::ResourceRequest;

// ---------------------------------------------------------------------------
// ErrorBoundaryLayer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ErrorBoundaryLayer {
    logger: Arc<dyn ExceptionLogger>,
    debug: bool,
}

impl ErrorBoundaryLayer {
    /// `debug` enables per-request diagnostics and full error detail in logs.
    #[must_use]
    pub fn new(logger: Arc<dyn ExceptionLogger>, debug: bool) -> Self {
        Self { logger, debug }
    }
}

impl<S> Layer<S> for ErrorBoundaryLayer {
    type Service = ErrorBoundaryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorBoundaryService {
            inner,
            logger: Arc::clone(&self.logger),
            debug: self.debug,
            not_ready: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorBoundaryService
// ---------------------------------------------------------------------------

pub struct ErrorBoundaryService<S> {
    inner: S,
    logger: Arc<dyn ExceptionLogger>,
    debug: bool,
    /// Readiness failure of the inner service, answered on the next call.
    not_ready: Option<ApiError>,
}

impl<S: Clone> Clone for ErrorBoundaryService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            logger: Arc::clone(&self.logger),
            debug: self.debug,
            not_ready: None,
        }
    }
}

impl<S> Service<ResourceRequest> for ErrorBoundaryService<S>
where
    S: Service<ResourceRequest, Response = Response, Error = ApiError> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = StageFuture<Infallible>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.inner.poll_ready(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            Poll::Ready(Err(error)) => {
                self.not_ready = Some(error);
                Poll::Ready(Ok(()))
            }
        }
    }

    fn call(&mut self, request: ResourceRequest) -> Self::Future {
        let logger = Arc::clone(&self.logger);
        let debug = self.debug;
        let method = request.method().clone();
        let path = request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_string(), ToString::to_string);
        let access = request.access_counter();

        let inner_fut = match self.not_ready.take() {
            Some(error) => Err(error),
            None => catch_unwind(AssertUnwindSafe(|| self.inner.call(request)))
                .map_err(ApiError::from_panic),
        };

        Box::pin(async move {
            let outcome = match inner_fut {
                Ok(fut) => AssertUnwindSafe(fut)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(ApiError::from_panic(panic))),
                Err(error) => Err(error),
            };

            let response = match outcome {
                Ok(response) => response,
                Err(error) => render_failure(&error, logger.as_ref(), debug),
            };

            if debug {
                tracing::debug!(%method, %path, accesses = access.get(), "request diagnostics");
            }

            Ok(response)
        })
    }
}

/// Classifies a failure, logs it when the classification asks for it, and
/// renders the `{"error": ...}` response.
fn render_failure(error: &ApiError, logger: &dyn ExceptionLogger, debug: bool) -> Response {
    let classified = classify_guarded(error);

    if debug {
        tracing::debug!(error = ?error, status = classified.status.as_u16(), "request failed");
    } else {
        tracing::info!(kind = error.kind(), status = classified.status.as_u16(), "request failed");
    }

    if classified.logged {
        log_guarded(logger, error);
    }

    classified.into_response()
}

/// Hands the error to the logger. A panicking logger cannot affect the response.
fn log_guarded(logger: &dyn ExceptionLogger, error: &ApiError) {
    if catch_unwind(AssertUnwindSafe(|| logger.log_exception(error))).is_err() {
        tracing::error!(kind = error.kind(), "exception logger panicked");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
