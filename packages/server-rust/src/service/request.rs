//! The request value carried through the dispatch pipeline.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use atrium_core::{RequestContext, RequestContextBuilder};
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

use super::error::ApiError;
use super::payload::Payload;

/// Route names with special meaning to the pipeline.
pub mod route_names {
    /// Project detail route: its primary key is the project id.
    pub const PROJECT: &str = "project";
}

// ---------------------------------------------------------------------------
// AccessCounter
// ---------------------------------------------------------------------------

/// Counts resource-store accesses made on behalf of one request.
///
/// Shared between the pipeline and the handler so debug diagnostics can
/// report the total after the response is produced.
#[derive(Debug, Clone, Default)]
pub struct AccessCounter(Arc<AtomicU64>);

impl AccessCounter {
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// ResourceRequest
// ---------------------------------------------------------------------------

/// An inbound request addressed to a named resource route.
///
/// Identifier path parameters are overwritten with their canonical ids once
/// the resolution stage has run. The rest of the canonicalized view lives in
/// the [`RequestContext`], which only the pipeline stages can modify.
#[derive(Debug)]
pub struct ResourceRequest {
    method: Method,
    uri: Uri,
    route_name: &'static str,
    path_params: BTreeMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
    context: RequestContextBuilder,
    access: AccessCounter,
}

impl ResourceRequest {
    #[must_use]
    pub fn new(route_name: &'static str, method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            route_name,
            path_params: BTreeMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            context: RequestContext::builder(),
            access: AccessCounter::default(),
        }
    }

    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_path_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.path_params.extend(params);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[must_use]
    pub fn route_name(&self) -> &'static str {
        self.route_name
    }

    /// Path parameter as matched by the router, or its canonical id after
    /// identifier resolution.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the body as a JSON object.
    pub fn json_payload(&self) -> Result<Payload, ApiError> {
        Payload::from_slice(&self.body)
    }

    /// The resolved request context.
    #[must_use]
    pub fn ctx(&self) -> &RequestContext {
        self.context.as_context()
    }

    /// Records one resource-store access for diagnostics.
    pub fn record_access(&self) {
        self.access.record();
    }

    #[must_use]
    pub fn access_counter(&self) -> AccessCounter {
        self.access.clone()
    }

    pub(crate) fn set_path_param(&mut self, name: &str, value: String) {
        if let Some(slot) = self.path_params.get_mut(name) {
            *slot = value;
        }
    }

    pub(crate) fn context_mut(&mut self) -> &mut RequestContextBuilder {
        &mut self.context
    }
}
