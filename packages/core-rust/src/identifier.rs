//! Canonical identifier checks and the path parameters that carry identifiers.
//!
//! Resources are keyed by UUIDs. Some path segments may instead carry a
//! human-readable alias (a project key such as `ENG`) that must be resolved
//! against the store before a handler runs.

use uuid::Uuid;

/// Path parameter names shared by every resource route.
pub mod params {
    /// Tenant (workspace) slug.
    pub const TENANT: &str = "slug";
    /// Generic primary key used by detail routes.
    pub const PRIMARY_KEY: &str = "pk";
    pub const PROJECT: &str = "project_id";
    pub const ISSUE: &str = "issue_id";
}

/// Returns `true` when `raw` is already in canonical (UUID) form.
///
/// Accepts every textual UUID form: hyphenated, simple, braced and URN.
#[must_use]
pub fn is_canonical(raw: &str) -> bool {
    Uuid::parse_str(raw).is_ok()
}

/// Identifier kinds that may appear in resource paths.
///
/// Resolution order follows declaration order: the project identifier is
/// resolved before the issue identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// Project id; may be given as a project key alias.
    Project,
    /// Issue id; no alias backend exists, values pass through unchanged.
    Issue,
}

impl IdentifierKind {
    /// All kinds in resolution order.
    pub const ALL: [IdentifierKind; 2] = [IdentifierKind::Project, IdentifierKind::Issue];

    /// Name of the path parameter carrying this identifier.
    #[must_use]
    pub fn param_name(self) -> &'static str {
        match self {
            Self::Project => params::PROJECT,
            Self::Issue => params::ISSUE,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Issue => "issue",
        }
    }
}
