//! Identifier resolution stage.
//!
//! Reads the raw path and query parameters once, canonicalizes identifiers
//! through the configured [`IdentifierResolver`], writes each canonical id
//! back over its path parameter and records the results in the request
//! context. Handlers never see alias forms.

use std::sync::Arc;
use std::task::{Context, Poll};

use atrium_core::{params, parse_list, query, IdentifierKind};
use axum::response::Response;
use tower::{Layer, Service};

use super::StageFuture;
use crate::service::error::ApiError;
use crate::service::request::{route_names, ResourceRequest};
use crate::service::resolver::IdentifierResolver;

// ---------------------------------------------------------------------------
// ResolveIdentifiersLayer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ResolveIdentifiersLayer {
    resolver: Arc<dyn IdentifierResolver>,
}

impl ResolveIdentifiersLayer {
    #[must_use]
    pub fn new(resolver: Arc<dyn IdentifierResolver>) -> Self {
        Self { resolver }
    }
}

impl<S> Layer<S> for ResolveIdentifiersLayer {
    type Service = ResolveIdentifiersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResolveIdentifiersService {
            inner,
            resolver: Arc::clone(&self.resolver),
        }
    }
}

// ---------------------------------------------------------------------------
// ResolveIdentifiersService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ResolveIdentifiersService<S> {
    inner: S,
    resolver: Arc<dyn IdentifierResolver>,
}

impl<S> Service<ResourceRequest> for ResolveIdentifiersService<S>
where
    S: Service<ResourceRequest, Response = Response, Error = ApiError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = ApiError;
    type Future = StageFuture<ApiError>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: ResourceRequest) -> Self::Future {
        // Take the service that was driven to readiness; leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let resolver = Arc::clone(&self.resolver);

        Box::pin(async move {
            resolve_request(resolver.as_ref(), &mut request).await?;
            inner.call(request).await
        })
    }
}

/// Populates the request context from raw path and query parameters.
///
/// Identifier kinds resolve in declaration order; the first failure aborts
/// the request.
pub async fn resolve_request(
    resolver: &dyn IdentifierResolver,
    request: &mut ResourceRequest,
) -> Result<(), ApiError> {
    let (fields, expand, filters) = split_query(request.uri().query())?;
    let tenant = request.path_param(params::TENANT).map(str::to_string);
    let access = request.access_counter();

    let mut resolved = Vec::with_capacity(IdentifierKind::ALL.len());
    for kind in IdentifierKind::ALL {
        let Some(raw) = request.path_param(kind.param_name()) else {
            continue;
        };
        let id = resolver
            .resolve(kind, tenant.as_deref(), raw, &access)
            .await?;
        resolved.push((kind.param_name(), id));
    }

    let has_project = resolved.iter().any(|(name, _)| *name == params::PROJECT);
    if !has_project
        && resolver.infers_project_from_route()
        && request.route_name() == route_names::PROJECT
    {
        if let Some(pk) = request.path_param(params::PRIMARY_KEY) {
            resolved.push((params::PROJECT, pk.to_string()));
        }
    }

    for (name, id) in &resolved {
        request.set_path_param(name, id.clone());
    }

    let ctx = request.context_mut();
    ctx.tenant_slug(tenant)
        .fields(fields)
        .expand(expand)
        .filter_params(filters);
    for (name, id) in resolved {
        ctx.resource_id(name, id);
    }
    Ok(())
}

type SplitQuery = (Option<Vec<String>>, Option<Vec<String>>, Vec<(String, String)>);

/// Splits the query string into `fields`, `expand` and the remaining filter
/// parameters. A repeated `fields`/`expand` key uses its last value.
fn split_query(raw: Option<&str>) -> Result<SplitQuery, ApiError> {
    let pairs: Vec<(String, String)> = match raw {
        Some(raw) => serde_urlencoded::from_str(raw)
            .map_err(|e| ApiError::ValidationFailure(format!("malformed query string: {e}")))?,
        None => Vec::new(),
    };

    let mut fields = None;
    let mut expand = None;
    let mut filters = Vec::new();
    for (key, value) in pairs {
        match key.as_str() {
            query::FIELDS => fields = Some(value),
            query::EXPAND => expand = Some(value),
            _ => filters.push((key, value)),
        }
    }

    Ok((
        parse_list(fields.as_deref()),
        parse_list(expand.as_deref()),
        filters,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use http::{Method, Uri};

    use super::*;
    use crate::service::resolver::{AliasResolver, PassThroughResolver};
    use crate::storage::MemoryIdentifierStore;

    const ENG_ID: &str = "11111111-1111-1111-1111-111111111111";

    fn alias_resolver() -> AliasResolver {
        let store = MemoryIdentifierStore::new();
        store.insert("acme", "ENG", ENG_ID);
        AliasResolver::new(Arc::new(store))
    }

    fn request(route: &'static str, uri: &'static str) -> ResourceRequest {
        ResourceRequest::new(route, Method::GET, Uri::from_static(uri))
    }

    #[tokio::test]
    async fn resolves_project_alias_and_query_lists() {
        let mut req = request("issues", "/api/acme/ENG/issues/?fields=name,,state&expand=&priority=high")
            .with_path_param("slug", "acme")
            .with_path_param("project_id", "ENG");

        resolve_request(&alias_resolver(), &mut req).await.unwrap();

        let ctx = req.ctx();
        assert_eq!(ctx.workspace_slug(), Some("acme"));
        assert_eq!(ctx.project_id(), Some(ENG_ID));
        assert_eq!(ctx.fields(), Some(&["name".to_string(), "state".to_string()][..]));
        assert_eq!(ctx.expand(), None);
        assert_eq!(ctx.filter_params(), &[("priority".to_string(), "high".to_string())]);
        assert_eq!(req.path_param("project_id"), Some(ENG_ID));
        assert_eq!(req.access_counter().get(), 1);
    }

    #[tokio::test]
    async fn project_route_infers_id_from_primary_key() {
        let mut req = request(route_names::PROJECT, "/api/acme/projects/p-1/")
            .with_path_param("slug", "acme")
            .with_path_param("pk", "44444444-4444-4444-4444-444444444444");

        resolve_request(&alias_resolver(), &mut req).await.unwrap();
        assert_eq!(req.ctx().project_id(), Some("44444444-4444-4444-4444-444444444444"));
        assert_eq!(req.path_param("project_id"), None);
    }

    #[tokio::test]
    async fn plain_variant_does_not_infer_from_route() {
        let mut req = request(route_names::PROJECT, "/api/acme/projects/p-1/")
            .with_path_param("slug", "acme")
            .with_path_param("pk", "44444444-4444-4444-4444-444444444444");

        resolve_request(&PassThroughResolver, &mut req).await.unwrap();
        assert_eq!(req.ctx().project_id(), None);
    }

    #[tokio::test]
    async fn other_routes_ignore_primary_key() {
        let mut req = request("issue", "/api/acme/issues/i-1/")
            .with_path_param("slug", "acme")
            .with_path_param("pk", "i-1");

        resolve_request(&alias_resolver(), &mut req).await.unwrap();
        assert_eq!(req.ctx().project_id(), None);
    }

    #[tokio::test]
    async fn issue_alias_is_kept_after_project_resolution() {
        let mut req = request("issue", "/api/acme/ENG/issues/ENG-7/")
            .with_path_param("slug", "acme")
            .with_path_param("project_id", "ENG")
            .with_path_param("issue_id", "ENG-7");

        resolve_request(&alias_resolver(), &mut req).await.unwrap();
        assert_eq!(req.ctx().project_id(), Some(ENG_ID));
        assert_eq!(req.ctx().issue_id(), Some("ENG-7"));
    }

    #[tokio::test]
    async fn unknown_alias_fails_with_not_found() {
        let mut req = request("issues", "/api/other/ENG/issues/")
            .with_path_param("slug", "other")
            .with_path_param("project_id", "ENG");

        let err = resolve_request(&alias_resolver(), &mut req).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn last_repeated_fields_value_wins() {
        let (fields, _, filters) = split_query(Some("fields=a&fields=b,c&q=x")).unwrap();
        assert_eq!(fields, Some(vec!["b".to_string(), "c".to_string()]));
        assert_eq!(filters, vec![("q".to_string(), "x".to_string())]);
    }

    #[test]
    fn percent_encoded_values_are_decoded() {
        let (fields, _, _) = split_query(Some("fields=name%2Cstate")).unwrap();
        assert_eq!(fields, Some(vec!["name".to_string(), "state".to_string()]));
    }

    #[test]
    fn missing_query_has_no_restrictions() {
        let (fields, expand, filters) = split_query(None).unwrap();
        assert!(fields.is_none());
        assert!(expand.is_none());
        assert!(filters.is_empty());
    }
}
