//! Shared helpers for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use atrium_core::{ExceptionLogger, IdentifierStore, Identity};
use axum::response::Response;
use http::HeaderMap;

use crate::service::error::ApiError;
use crate::traits::Authenticator;

/// Collects a response body and parses it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Identifier store whose backend is always down.
pub struct FailingStore;

#[async_trait]
impl IdentifierStore for FailingStore {
    async fn lookup_canonical_id(&self, _tenant: &str, _key: &str) -> anyhow::Result<Option<String>> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

/// Exception logger that keeps the rendered messages.
#[derive(Default)]
pub struct RecordingLogger {
    messages: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("lock").clone()
    }
}

impl ExceptionLogger for RecordingLogger {
    fn log_exception(&self, error: &(dyn std::error::Error + Send + Sync + 'static)) {
        self.messages.lock().expect("lock").push(error.to_string());
    }
}

/// Exception logger that panics on every call.
pub struct PanickingLogger;

impl ExceptionLogger for PanickingLogger {
    fn log_exception(&self, _error: &(dyn std::error::Error + Send + Sync + 'static)) {
        panic!("log sink unavailable");
    }
}

/// Authenticator whose identity provider is always down.
pub struct FailingAuthenticator;

#[async_trait]
impl Authenticator for FailingAuthenticator {
    async fn authenticate(&self, _headers: &HeaderMap) -> Result<Identity, ApiError> {
        Err(ApiError::internal("identity provider timed out"))
    }
}
