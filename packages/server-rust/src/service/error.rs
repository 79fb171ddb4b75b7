//! Closed taxonomy of failures raised while dispatching a resource request.

use std::any::Any;

use axum::extract::rejection::JsonRejection;

/// Every failure the pipeline can observe, from identifier resolution through
/// the resource handler.
///
/// The set is closed on purpose: the classifier matches it exhaustively, and
/// anything foreign enters as [`ApiError::Unclassified`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input failed validation (malformed body, bad query string, wrong types).
    #[error("validation failed: {0}")]
    ValidationFailure(String),
    /// The store rejected a write because a constraint was violated.
    #[error("integrity constraint violated: {0}")]
    IntegrityConflict(String),
    /// A referenced object does not exist.
    #[error("{0} does not exist")]
    NotFound(String),
    /// A required key was absent from structured input.
    #[error("missing required key: {key}")]
    MissingField { key: String },
    /// The route requires an authenticated caller and none was presented.
    #[error("authentication credentials were not provided")]
    NotAuthenticated,
    /// Anything else: backend failures, handler bugs, panics.
    #[error(transparent)]
    Unclassified(anyhow::Error),
}

impl ApiError {
    /// Shorthand for a missing-key failure.
    pub fn missing_field(key: impl Into<String>) -> Self {
        Self::MissingField { key: key.into() }
    }

    /// Wraps an arbitrary message as an unclassified failure.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::Unclassified(anyhow::anyhow!("{message}"))
    }

    /// Converts an `anyhow::Error`, recovering an `ApiError` that was wrapped
    /// inside it. Anything else is unclassified.
    #[must_use]
    pub fn from_any(error: anyhow::Error) -> Self {
        match error.downcast::<ApiError>() {
            Ok(api) => api,
            Err(other) => Self::Unclassified(other),
        }
    }

    /// Converts a caught panic payload into an unclassified failure.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Unclassified(anyhow::anyhow!("handler panicked: {message}"))
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailure(_) => "validation_failure",
            Self::IntegrityConflict(_) => "integrity_conflict",
            Self::NotFound(_) => "not_found",
            Self::MissingField { .. } => "missing_field",
            Self::NotAuthenticated => "not_authenticated",
            Self::Unclassified(_) => "unclassified",
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::ValidationFailure(error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::ValidationFailure(rejection.body_text())
    }
}
