//! Resource routing: dispatches a `ResourceRequest` to the handler registered
//! under its route name.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::response::Response;
use tower::Service;

use super::error::ApiError;
use super::request::ResourceRequest;

// ---------------------------------------------------------------------------
// ResourceHandler
// ---------------------------------------------------------------------------

/// Business logic behind one resource route.
///
/// Handlers receive the request after identifiers are canonicalized, the
/// caller is authenticated and the locale is active. Any error they return
/// is classified by the pipeline.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn handle(&self, request: ResourceRequest) -> Result<Response, ApiError>;
}

/// Adapter turning an async closure into a [`ResourceHandler`].
pub struct HandlerFn<F>(F);

/// Wraps an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(ResourceRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> ResourceHandler for HandlerFn<F>
where
    F: Fn(ResourceRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    async fn handle(&self, request: ResourceRequest) -> Result<Response, ApiError> {
        (self.0)(request).await
    }
}

// ---------------------------------------------------------------------------
// ResourceRouter
// ---------------------------------------------------------------------------

type RouterFuture = Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>;

/// Routes requests to handlers by route name.
///
/// Cloning is cheap: the handler table is shared. Registration after the
/// router has been cloned copies the table.
#[derive(Clone, Default)]
pub struct ResourceRouter {
    handlers: Arc<HashMap<&'static str, Arc<dyn ResourceHandler>>>,
}

impl ResourceRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for the given route name, replacing any previous one.
    pub fn register<H>(&mut self, route_name: &'static str, handler: H)
    where
        H: ResourceHandler + 'static,
    {
        Arc::make_mut(&mut self.handlers).insert(route_name, Arc::new(handler));
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with<H>(mut self, route_name: &'static str, handler: H) -> Self
    where
        H: ResourceHandler + 'static,
    {
        self.register(route_name, handler);
        self
    }

    #[must_use]
    pub fn has_route(&self, route_name: &str) -> bool {
        self.handlers.contains_key(route_name)
    }
}

impl Service<ResourceRequest> for ResourceRouter {
    type Response = Response;
    type Error = ApiError;
    type Future = RouterFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ResourceRequest) -> Self::Future {
        let route_name = request.route_name();
        match self.handlers.get(route_name) {
            Some(handler) => {
                let handler = Arc::clone(handler);
                Box::pin(async move { handler.handle(request).await })
            }
            None => Box::pin(async move {
                Err(ApiError::internal(format!(
                    "no handler registered for route `{route_name}`"
                )))
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
