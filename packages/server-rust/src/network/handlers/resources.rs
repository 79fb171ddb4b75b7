//! Mounts resource routes on axum and hands each request to the dispatch
//! pipeline.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Request};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tower::{Service, ServiceExt};

use crate::network::ShutdownController;
use crate::service::{ApiError, ResourceRequest};

/// Declared resource routes: axum path patterns paired with route names.
///
/// ```ignore
/// let routes = ResourceRoutes::new()
///     .route("/api/workspaces/{slug}/projects/{pk}/", route_names::PROJECT)
///     .route("/api/workspaces/{slug}/projects/{project_id}/issues/", "issues");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceRoutes {
    routes: Vec<(String, &'static str)>,
}

impl ResourceRoutes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, path: impl Into<String>, route_name: &'static str) -> Self {
        self.routes.push((path.into(), route_name));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|(_, name)| *name)
    }

    /// Builds an axum router that dispatches every declared path through
    /// `pipeline`, for any HTTP method.
    ///
    /// Each dispatched request holds an in-flight guard on `shutdown` until
    /// its response is produced.
    pub fn into_router<P>(
        self,
        pipeline: P,
        shutdown: Arc<ShutdownController>,
        max_body_bytes: usize,
    ) -> Router
    where
        P: Service<ResourceRequest, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        P::Future: Send + 'static,
    {
        let mut router = Router::new();
        for (path, route_name) in self.routes {
            let pipeline = pipeline.clone();
            let shutdown = Arc::clone(&shutdown);
            router = router.route(
                &path,
                any(
                    move |params: Result<Path<HashMap<String, String>>, PathRejection>,
                          request: Request| {
                        dispatch(
                            pipeline.clone(),
                            Arc::clone(&shutdown),
                            route_name,
                            max_body_bytes,
                            params,
                            request,
                        )
                    },
                ),
            );
        }
        router
    }
}

async fn dispatch<P>(
    pipeline: P,
    shutdown: Arc<ShutdownController>,
    route_name: &'static str,
    max_body_bytes: usize,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
    request: Request,
) -> Response
where
    P: Service<ResourceRequest, Response = Response, Error = Infallible>,
{
    let _in_flight = shutdown.in_flight_guard();

    let path_params = match params {
        Ok(Path(params)) => params,
        Err(PathRejection::MissingPathParams(_)) => HashMap::new(),
        Err(rejection) => {
            tracing::debug!(route = route_name, %rejection, "path parameters rejected");
            return ApiError::ValidationFailure(rejection.body_text()).into_response();
        }
    };

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(route = route_name, error = %e, "request body rejected");
            return ApiError::ValidationFailure(format!("unreadable body: {e}")).into_response();
        }
    };

    let request = ResourceRequest::new(route_name, parts.method, parts.uri)
        .with_path_params(path_params)
        .with_headers(parts.headers)
        .with_body(body);

    match pipeline.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::Json;
    use http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::service::{handler_fn, ResourceRouter};
    use crate::test_support::body_json;

    fn echo_router() -> ResourceRouter {
        ResourceRouter::new().with(
            "echo",
            handler_fn(|req: ResourceRequest| async move {
                Ok::<_, ApiError>(
                    Json(json!({
                        "route": req.route_name(),
                        "method": req.method().as_str(),
                        "slug": req.path_param("slug"),
                        "body": String::from_utf8_lossy(req.body()),
                    }))
                    .into_response(),
                )
            }),
        )
    }

    /// The bare router maps `ApiError` to a response so it can stand in for
    /// a full pipeline here.
    fn infallible(router: ResourceRouter) -> impl Service<
        ResourceRequest,
        Response = Response,
        Error = Infallible,
        Future = impl std::future::Future<Output = Result<Response, Infallible>> + Send + 'static,
    > + Clone
           + Send
           + Sync
           + 'static {
        tower::service_fn(move |request: ResourceRequest| {
            let router = router.clone();
            async move {
                Ok::<_, Infallible>(match router.oneshot(request).await {
                    Ok(response) => response,
                    Err(error) => error.into_response(),
                })
            }
        })
    }

    #[tokio::test]
    async fn path_params_method_and_body_reach_pipeline() {
        let app = ResourceRoutes::new()
            .route("/api/{slug}/echo/", "echo")
            .into_router(
                infallible(echo_router()),
                Arc::new(ShutdownController::new()),
                1024,
            );

        let request = http::Request::post("/api/acme/echo/")
            .body(Body::from("hello"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"route": "echo", "method": "POST", "slug": "acme", "body": "hello"})
        );
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = ResourceRoutes::new()
            .route("/api/{slug}/echo/", "echo")
            .into_router(
                infallible(echo_router()),
                Arc::new(ShutdownController::new()),
                4,
            );

        let request = http::Request::post("/api/acme/echo/")
            .body(Body::from("too large"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn in_flight_guard_released_after_response() {
        let shutdown = Arc::new(ShutdownController::new());
        let app = ResourceRoutes::new()
            .route("/echo", "echo")
            .into_router(infallible(echo_router()), Arc::clone(&shutdown), 1024);

        let response = app
            .oneshot(http::Request::get("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(shutdown.in_flight_count(), 0);
    }

    #[test]
    fn names_keep_declaration_order() {
        let routes = ResourceRoutes::new().route("/a", "a").route("/b", "b");
        assert_eq!(routes.len(), 2);
        assert_eq!(routes.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
