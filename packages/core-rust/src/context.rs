use std::collections::BTreeMap;

use crate::identifier::params;
use crate::types::Principal;

/// Default zone name used when no per-user zone is active.
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Per-request context handed to resource handlers.
///
/// Built by the dispatch pipeline: identifiers are canonicalized, the caller
/// is authenticated and the locale is chosen before a handler ever sees it.
/// Handlers only get shared references, so the context is read-only from
/// their point of view.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    tenant_slug: Option<String>,
    /// Resolved identifiers keyed by path parameter name.
    resource_ids: BTreeMap<String, String>,
    principal: Option<Principal>,
    fields: Option<Vec<String>>,
    expand: Option<Vec<String>>,
    time_zone: Option<String>,
    /// Remaining query parameters, left for the external filter backend.
    filter_params: Vec<(String, String)>,
}

impl RequestContext {
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Tenant slug from the path, if the route has one.
    #[must_use]
    pub fn workspace_slug(&self) -> Option<&str> {
        self.tenant_slug.as_deref()
    }

    /// Canonical id stored under the given path parameter name.
    #[must_use]
    pub fn resource_id(&self, param: &str) -> Option<&str> {
        self.resource_ids.get(param).map(String::as_str)
    }

    /// Canonical project id.
    ///
    /// On routes where the project is the primary resource the pipeline
    /// records the primary key here as well, so handlers need no special case.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.resource_id(params::PROJECT)
    }

    #[must_use]
    pub fn issue_id(&self) -> Option<&str> {
        self.resource_id(params::ISSUE)
    }

    /// All resolved identifiers.
    #[must_use]
    pub fn resource_ids(&self) -> &BTreeMap<String, String> {
        &self.resource_ids
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Requested field list. `None` means "all fields".
    #[must_use]
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Requested expansion list. `None` means "no expansion requested".
    #[must_use]
    pub fn expand(&self) -> Option<&[String]> {
        self.expand.as_deref()
    }

    /// Name of the zone active for this request.
    #[must_use]
    pub fn time_zone(&self) -> &str {
        self.time_zone.as_deref().unwrap_or(DEFAULT_TIME_ZONE)
    }

    /// Query parameters other than `fields` and `expand`, in request order.
    #[must_use]
    pub fn filter_params(&self) -> &[(String, String)] {
        &self.filter_params
    }
}

/// Incremental builder used by the pipeline stages.
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    inner: RequestContext,
}

impl RequestContextBuilder {
    pub fn tenant_slug(&mut self, slug: Option<String>) -> &mut Self {
        self.inner.tenant_slug = slug;
        self
    }

    pub fn resource_id(&mut self, param: impl Into<String>, id: impl Into<String>) -> &mut Self {
        self.inner.resource_ids.insert(param.into(), id.into());
        self
    }

    pub fn principal(&mut self, principal: Option<Principal>) -> &mut Self {
        self.inner.principal = principal;
        self
    }

    pub fn fields(&mut self, fields: Option<Vec<String>>) -> &mut Self {
        self.inner.fields = fields;
        self
    }

    pub fn expand(&mut self, expand: Option<Vec<String>>) -> &mut Self {
        self.inner.expand = expand;
        self
    }

    pub fn time_zone(&mut self, zone: impl Into<String>) -> &mut Self {
        self.inner.time_zone = Some(zone.into());
        self
    }

    pub fn filter_params(&mut self, params: Vec<(String, String)>) -> &mut Self {
        self.inner.filter_params = params;
        self
    }

    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        self.inner.tenant_slug.as_deref()
    }

    /// Read view of the context as built so far.
    #[must_use]
    pub fn as_context(&self) -> &RequestContext {
        &self.inner
    }

    #[must_use]
    pub fn build(self) -> RequestContext {
        self.inner
    }
}
