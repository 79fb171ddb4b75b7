use serde::{Deserialize, Serialize};

/// Authenticated principal attached to a request by the external authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier for the authenticated user.
    pub id: String,
    /// Human-readable name, if the authenticator provides one.
    pub display_name: Option<String>,
    /// IANA time-zone preference (e.g. `"Asia/Kolkata"`). `None` means the
    /// user never set one.
    pub time_zone: Option<String>,
}

impl Principal {
    /// Creates a principal with no display name and no time-zone preference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            time_zone: None,
        }
    }

    /// Sets the time-zone preference.
    #[must_use]
    pub fn with_time_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = Some(zone.into());
        self
    }
}

/// Outcome of authentication: either a principal or an anonymous caller.
///
/// Anonymous is a normal outcome, not an error. Whether anonymous callers may
/// proceed is decided by the pipeline's authentication stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(Principal),
    Anonymous,
}

impl Identity {
    /// Returns the principal for authenticated identities.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Consumes the identity, yielding the principal if any.
    #[must_use]
    pub fn into_principal(self) -> Option<Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            Self::Anonymous => None,
        }
    }
}
