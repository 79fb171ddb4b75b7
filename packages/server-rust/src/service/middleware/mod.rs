//! Tower middleware stages of the resource dispatch pipeline.
//!
//! - [`boundary`]: Turns every failure (including panics) into one structured response
//! - [`metrics`]: Request timing and counting via `tracing` spans and `metrics`
//! - [`resolve`]: Canonicalizes identifiers and parses query parameters
//! - [`authenticate`]: Attaches the caller and enforces the authentication policy
//! - [`locale`]: Activates the caller's time zone for the rest of the request
//! - [`pipeline`]: Composes all stages around a `ResourceRouter`

use std::future::Future;
use std::pin::Pin;

use axum::response::Response;

pub mod authenticate;
pub mod boundary;
pub mod locale;
pub mod metrics;
pub mod pipeline;
pub mod resolve;

pub use authenticate::AuthenticateLayer;
pub use boundary::ErrorBoundaryLayer;
pub use locale::LocaleLayer;
pub use metrics::MetricsLayer;
pub use pipeline::{build_request_pipeline, PipelineCollaborators};
pub use resolve::{resolve_request, ResolveIdentifiersLayer};

/// Boxed future returned by every stage.
pub type StageFuture<E> = Pin<Box<dyn Future<Output = Result<Response, E>> + Send>>;
