//! Networking: configuration, transport middleware, route mounting, health
//! probes and shutdown control.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use config::*;
pub use handlers::{AppState, ResourceRoutes};
pub use module::NetworkModule;
pub use shutdown::*;
