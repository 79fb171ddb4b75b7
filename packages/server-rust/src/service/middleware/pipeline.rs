//! Pipeline composition: wraps a `ResourceRouter` in every dispatch stage.

use std::convert::Infallible;
use std::sync::Arc;

use atrium_core::ExceptionLogger;
use axum::response::Response;
use tower::{Service, ServiceBuilder};

use super::authenticate::AuthenticateLayer;
use super::boundary::ErrorBoundaryLayer;
use super::locale::LocaleLayer;
use super::metrics::MetricsLayer;
use super::resolve::ResolveIdentifiersLayer;
use super::StageFuture;
use crate::service::config::ServerConfig;
use crate::service::request::ResourceRequest;
use crate::service::resolver::IdentifierResolver;
use crate::service::router::ResourceRouter;
use crate::traits::Authenticator;

/// External collaborators the pipeline delegates to.
#[derive(Clone)]
pub struct PipelineCollaborators {
    pub resolver: Arc<dyn IdentifierResolver>,
    pub authenticator: Arc<dyn Authenticator>,
    pub logger: Arc<dyn ExceptionLogger>,
}

/// Build the request pipeline by wrapping the `ResourceRouter` with the
/// dispatch stages.
///
/// Stage order (outermost to innermost):
/// 1. `ErrorBoundaryLayer` -- classify failures and panics into one response
/// 2. `MetricsLayer` -- record timing and outcome of everything below
/// 3. `ResolveIdentifiersLayer` -- canonical ids, `fields`/`expand`, filters
/// 4. `AuthenticateLayer` -- principal and the authenticated-only policy
/// 5. `LocaleLayer` -- caller's time zone, active until the handler returns
///
/// The returned service never fails: every error is already a response.
#[must_use]
pub fn build_request_pipeline(
    router: ResourceRouter,
    collaborators: &PipelineCollaborators,
    config: &ServerConfig,
) -> impl Service<
    ResourceRequest,
    Response = Response,
    Error = Infallible,
    Future = StageFuture<Infallible>,
> + Clone
       + Send
       + Sync
       + 'static {
    ServiceBuilder::new()
        .layer(ErrorBoundaryLayer::new(
            Arc::clone(&collaborators.logger),
            config.debug,
        ))
        .layer(MetricsLayer)
        .layer(ResolveIdentifiersLayer::new(Arc::clone(
            &collaborators.resolver,
        )))
        .layer(AuthenticateLayer::new(
            Arc::clone(&collaborators.authenticator),
            config.require_authentication,
        ))
        .layer(LocaleLayer::new(config.default_time_zone))
        .service(router)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
