use async_trait::async_trait;
use atrium_core::{ExceptionLogger, Identity, Principal};
use http::HeaderMap;

use crate::service::ApiError;

/// Session/credential validation, owned by an external authentication layer.
/// Implementations: session cookies, API tokens, trusted proxy headers (tests).
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Identify the caller from request headers.
    ///
    /// Missing credentials yield `Ok(Identity::Anonymous)`; the pipeline
    /// decides whether anonymous callers may proceed.
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ApiError>;
}

/// Authenticator for deployments that run behind a trusted gateway which
/// forwards the caller in `x-user-id` and `x-user-timezone` headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedHeaderAuthenticator;

impl TrustedHeaderAuthenticator {
    pub const USER_ID: &'static str = "x-user-id";
    pub const USER_TIME_ZONE: &'static str = "x-user-timezone";
}

#[async_trait]
impl Authenticator for TrustedHeaderAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let Some(user_id) = header(Self::USER_ID) else {
            return Ok(Identity::Anonymous);
        };

        let mut principal = Principal::new(user_id);
        principal.time_zone = header(Self::USER_TIME_ZONE).map(str::to_string);
        Ok(Identity::Authenticated(principal))
    }
}

/// Exception logger writing through `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingExceptionLogger;

impl ExceptionLogger for TracingExceptionLogger {
    fn log_exception(&self, error: &(dyn std::error::Error + Send + Sync + 'static)) {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        tracing::error!(error = %error, causes = ?chain, "unhandled request error");
    }
}
