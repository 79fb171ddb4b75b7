//! Atrium Server — multi-tenant resource dispatch on axum and tower.
//!
//! Every resource route runs through one pipeline that canonicalizes
//! identifiers, authenticates the caller, activates the caller's time zone
//! and classifies failures into stable JSON responses.

pub mod network;
pub mod service;
pub mod storage;
pub mod telemetry;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use network::{NetworkConfig, NetworkModule, ResourceRoutes};
pub use service::{build_request_pipeline, ApiError, PipelineCollaborators, ServerConfig};
pub use storage::MemoryIdentifierStore;
pub use traits::{Authenticator, TracingExceptionLogger, TrustedHeaderAuthenticator};
