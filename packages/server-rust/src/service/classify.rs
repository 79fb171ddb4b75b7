//! Error classification: maps an [`ApiError`] to the status code and message
//! sent on the wire.
//!
//! Messages are fixed strings. The underlying error text never reaches the
//! client; it only reaches the exception logger, and only for the kinds
//! marked as logged.

use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// User-facing messages, one per classified outcome.
pub mod messages {
    pub const INVALID_PAYLOAD: &str = "The payload is not valid";
    pub const INVALID_DETAIL: &str = "Please provide valid detail";
    pub const NOT_FOUND: &str = "The required object does not exist.";
    pub const MISSING_KEY: &str = "The required key does not exist.";
    pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
    pub const SERVER_ERROR: &str = "Something went wrong please try again later";
}

// ---------------------------------------------------------------------------
// ClassifiedError
// ---------------------------------------------------------------------------

/// Wire-level outcome of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedError {
    pub status: StatusCode,
    pub message: &'static str,
    /// Whether the underlying error is sent to the exception logger.
    pub logged: bool,
}

impl ClassifiedError {
    /// The catch-all 500 outcome.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: messages::SERVER_ERROR,
            logged: true,
        }
    }

    const fn new(status: StatusCode, message: &'static str, logged: bool) -> Self {
        Self {
            status,
            message,
            logged,
        }
    }
}

impl IntoResponse for ClassifiedError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Body of every failure response: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Maps an error to its wire outcome. Total over [`ApiError`].
#[must_use]
pub fn classify(error: &ApiError) -> ClassifiedError {
    match error {
        ApiError::IntegrityConflict(_) => {
            ClassifiedError::new(StatusCode::BAD_REQUEST, messages::INVALID_PAYLOAD, false)
        }
        ApiError::ValidationFailure(_) => {
            ClassifiedError::new(StatusCode::BAD_REQUEST, messages::INVALID_DETAIL, false)
        }
        ApiError::NotFound(_) => {
            ClassifiedError::new(StatusCode::NOT_FOUND, messages::NOT_FOUND, false)
        }
        ApiError::MissingField { .. } => {
            ClassifiedError::new(StatusCode::BAD_REQUEST, messages::MISSING_KEY, true)
        }
        ApiError::NotAuthenticated => {
            ClassifiedError::new(StatusCode::FORBIDDEN, messages::NOT_AUTHENTICATED, false)
        }
        ApiError::Unclassified(_) => ClassifiedError::fallback(),
    }
}

/// [`classify`], degrading to the 500 outcome if classification itself panics.
#[must_use]
pub fn classify_guarded(error: &ApiError) -> ClassifiedError {
    classify_with(classify, error)
}

fn classify_with<F>(classifier: F, error: &ApiError) -> ClassifiedError
where
    F: FnOnce(&ApiError) -> ClassifiedError,
{
    catch_unwind(AssertUnwindSafe(|| classifier(error))).unwrap_or_else(|_| {
        tracing::error!(kind = error.kind(), "error classification panicked");
        ClassifiedError::fallback()
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        classify_guarded(&self).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
