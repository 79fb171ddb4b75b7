//! HTTP handler definitions for the Atrium server.
//!
//! `AppState` carries what the probe handlers need; resource routes get
//! their own per-route state from [`ResourceRoutes`].

pub mod health;
pub mod resources;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use resources::ResourceRoutes;

use std::sync::Arc;
use std::time::Instant;

use super::{NetworkConfig, ShutdownController};

/// Shared state for the health handlers. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub shutdown: Arc<ShutdownController>,
    pub config: Arc<NetworkConfig>,
    /// Number of resource routes mounted on the router.
    pub resource_routes: usize,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
