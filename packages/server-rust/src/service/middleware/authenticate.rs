//! Authentication stage: attaches the caller's principal to the context and
//! enforces the authenticated-only policy.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::response::Response;
use tower::{Layer, Service};

use super::StageFuture;
use crate::service::error::ApiError;
use crate::service::request::ResourceRequest;
use crate::traits::Authenticator;

#[derive(Clone)]
pub struct AuthenticateLayer {
    authenticator: Arc<dyn Authenticator>,
    require_authentication: bool,
}

impl AuthenticateLayer {
    #[must_use]
    pub fn new(authenticator: Arc<dyn Authenticator>, require_authentication: bool) -> Self {
        Self {
            authenticator,
            require_authentication,
        }
    }
}

impl<S> Layer<S> for AuthenticateLayer {
    type Service = AuthenticateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticateService {
            inner,
            authenticator: Arc::clone(&self.authenticator),
            require_authentication: self.require_authentication,
        }
    }
}

#[derive(Clone)]
pub struct AuthenticateService<S> {
    inner: S,
    authenticator: Arc<dyn Authenticator>,
    require_authentication: bool,
}

impl<S> Service<ResourceRequest> for AuthenticateService<S>
where
    S: Service<ResourceRequest, Response = Response, Error = ApiError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = ApiError;
    type Future = StageFuture<ApiError>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: ResourceRequest) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let authenticator = Arc::clone(&self.authenticator);
        let require_authentication = self.require_authentication;

        Box::pin(async move {
            let identity = authenticator.authenticate(request.headers()).await?;
            if require_authentication && !identity.is_authenticated() {
                return Err(ApiError::NotAuthenticated);
            }
            request.context_mut().principal(identity.into_principal());
            inner.call(request).await
        })
    }
}
