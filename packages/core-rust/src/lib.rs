//! Atrium Core — request context, principals, canonical identifiers and the
//! collaborator contracts shared by every resource endpoint.

pub mod context;
pub mod identifier;
pub mod query;
pub mod traits;
pub mod types;

pub use context::{RequestContext, RequestContextBuilder, DEFAULT_TIME_ZONE};
pub use identifier::{is_canonical, params, IdentifierKind};
pub use query::parse_list;
pub use traits::{ExceptionLogger, IdentifierStore};
pub use types::{Identity, Principal};
