//! Per-request time-zone context.
//!
//! The active zone is a task-local binding established by
//! [`LocaleContext::scope`]. The binding exists only while the scoped future
//! is being polled, so it ends on success, error, panic and cancellation
//! alike, and can never carry over to another request served by the same
//! worker thread.

use std::future::Future;

use atrium_core::Principal;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

tokio::task_local! {
    static ACTIVE_LOCALE: LocaleContext;
}

/// The time-zone setting chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleContext {
    zone: Tz,
    /// `true` when the zone came from the caller's own preference.
    per_user: bool,
}

impl LocaleContext {
    /// Context with no per-user zone: the deployment default applies.
    #[must_use]
    pub fn deactivated(default_zone: Tz) -> Self {
        Self {
            zone: default_zone,
            per_user: false,
        }
    }

    /// Context for a specific zone chosen by the caller.
    #[must_use]
    pub fn activated(zone: Tz) -> Self {
        Self {
            zone,
            per_user: true,
        }
    }

    /// Chooses the context for a caller.
    ///
    /// Anonymous callers and principals without a preference get the
    /// default. An unrecognised preference also falls back to the default
    /// with a warning: a bad profile setting must not fail the request.
    #[must_use]
    pub fn for_principal(principal: Option<&Principal>, default_zone: Tz) -> Self {
        let Some(principal) = principal else {
            return Self::deactivated(default_zone);
        };
        let Some(name) = principal.time_zone.as_deref() else {
            return Self::deactivated(default_zone);
        };

        match name.parse::<Tz>() {
            Ok(zone) => Self::activated(zone),
            Err(_) => {
                tracing::warn!(
                    user = %principal.id,
                    zone = name,
                    "unrecognised time-zone preference, using default"
                );
                Self::deactivated(default_zone)
            }
        }
    }

    #[must_use]
    pub fn zone(&self) -> Tz {
        self.zone
    }

    #[must_use]
    pub fn is_per_user(&self) -> bool {
        self.per_user
    }

    /// Runs `fut` with this context bound as the active locale.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        ACTIVE_LOCALE.scope(self, fut).await
    }

    /// Synchronous counterpart of [`scope`](Self::scope).
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        ACTIVE_LOCALE.sync_scope(self, f)
    }
}

/// The locale bound to the current task, if any.
#[must_use]
pub fn current_locale() -> Option<LocaleContext> {
    ACTIVE_LOCALE.try_with(|locale| *locale).ok()
}

/// The zone in effect for the current task; UTC outside any request scope.
#[must_use]
pub fn current_time_zone() -> Tz {
    current_locale().map_or(Tz::UTC, |locale| locale.zone)
}

/// The caller's own zone, only when one was activated for this request.
#[must_use]
pub fn active_user_zone() -> Option<Tz> {
    current_locale()
        .filter(LocaleContext::is_per_user)
        .map(|locale| locale.zone)
}

/// Converts a UTC instant into the zone in effect for the current task.
#[must_use]
pub fn localize(at: DateTime<Utc>) -> DateTime<Tz> {
    at.with_timezone(&current_time_zone())
}
