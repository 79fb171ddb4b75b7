//! Locale stage: binds the caller's time zone for everything further in.

use std::task::{Context, Poll};

use axum::response::Response;
use chrono_tz::Tz;
use tower::{Layer, Service};

use super::StageFuture;
use crate::service::error::ApiError;
use crate::service::locale::LocaleContext;
use crate::service::request::ResourceRequest;

#[derive(Debug, Clone, Copy)]
pub struct LocaleLayer {
    default_zone: Tz,
}

impl LocaleLayer {
    #[must_use]
    pub fn new(default_zone: Tz) -> Self {
        Self { default_zone }
    }
}

impl<S> Layer<S> for LocaleLayer {
    type Service = LocaleService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LocaleService {
            inner,
            default_zone: self.default_zone,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocaleService<S> {
    inner: S,
    default_zone: Tz,
}

impl<S> Service<ResourceRequest> for LocaleService<S>
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

        let locale = LocaleContext::for_principal(request.ctx().principal(), self.default_zone);
        request.context_mut().time_zone(locale.zone().name());

        // The inner call happens inside the scope so nothing downstream can
        // observe a request without its locale.
        Box::pin(locale.scope(async move { inner.call(request).await }))
    }
}

#[cfg(test)]
mod tests {
    use atrium_core::Principal;
    use axum::response::IntoResponse;
    use http::{Method, StatusCode, Uri};
    use tower::ServiceExt;

    use super::*;
    use crate::service::locale::{active_user_zone, current_time_zone};
    use crate::service::router::{handler_fn, ResourceRouter};

    fn zone_echo() -> ResourceRouter {
        ResourceRouter::new().with(
            "zone",
            handler_fn(|req: ResourceRequest| async move {
                assert_eq!(req.ctx().time_zone(), current_time_zone().name());
                let body = format!("{}|{}", current_time_zone().name(), active_user_zone().is_some());
                Ok::<_, ApiError>((StatusCode::OK, body).into_response())
            }),
        )
    }

    fn request(principal: Option<Principal>) -> ResourceRequest {
        let mut req = ResourceRequest::new("zone", Method::GET, Uri::from_static("/zone"));
        req.context_mut().principal(principal);
        req
    }

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn zone_is_scoped_to_each_request() {
        let svc = LocaleLayer::new(Tz::UTC).layer(zone_echo());

        let user = Principal::new("u-1").with_time_zone("Asia/Kolkata");
        let first = svc.clone().oneshot(request(Some(user))).await.unwrap();
        assert_eq!(body(first).await, "Asia/Kolkata|true");

        let second = svc.oneshot(request(None)).await.unwrap();
        assert_eq!(body(second).await, "UTC|false");
    }

    #[tokio::test]
    async fn configured_default_applies_to_anonymous() {
        let svc = LocaleLayer::new(Tz::Europe__Berlin).layer(zone_echo());
        let response = svc.oneshot(request(None)).await.unwrap();
        assert_eq!(body(response).await, "Europe/Berlin|false");
    }
}
