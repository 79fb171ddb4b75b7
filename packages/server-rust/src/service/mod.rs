//! Resource request dispatch.
//!
//! Every resource endpoint runs through the same pipeline:
//!
//! 1. **Resolution** (`resolver`, `middleware::resolve`): alias path segments
//!    become canonical ids, query lists become field/expand selections
//! 2. **Authentication** (`middleware::authenticate`): the caller's principal
//! 3. **Locale** (`locale`, `middleware::locale`): the caller's time zone
//! 4. **Routing** (`router`): the handler registered for the route name
//! 5. **Classification** (`classify`, `middleware::boundary`): any failure
//!    becomes one `{"error": ...}` response with a stable status

pub mod classify;
pub mod config;
pub mod error;
pub mod locale;
pub mod middleware;
pub mod payload;
pub mod request;
pub mod resolver;
pub mod router;

// Re-export key types for convenient access.
pub use classify::{classify, ClassifiedError, ErrorBody};
pub use config::ServerConfig;
pub use error::ApiError;
pub use locale::{active_user_zone, current_time_zone, localize, LocaleContext};
pub use middleware::{build_request_pipeline, PipelineCollaborators, StageFuture};
pub use payload::Payload;
pub use request::{route_names, AccessCounter, ResourceRequest};
pub use resolver::{AliasResolver, IdentifierResolver, PassThroughResolver};
pub use router::{handler_fn, ResourceHandler, ResourceRouter};
