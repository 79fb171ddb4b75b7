use chrono_tz::Tz;

/// Dispatch-level configuration shared by every resource route.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Verbose mode: per-request diagnostics and full error detail in logs.
    pub debug: bool,
    /// Reject anonymous callers with 403 before the handler runs.
    pub require_authentication: bool,
    /// Zone used when the caller has no per-user preference.
    pub default_time_zone: Tz,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            require_authentication: true,
            default_time_zone: Tz::UTC,
        }
    }
}
