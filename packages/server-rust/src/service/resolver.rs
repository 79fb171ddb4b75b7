//! Identifier resolution: turns alias path segments into canonical ids.
//!
//! Two strategies back the two handler shapes:
//! - [`AliasResolver`] for resource routes: project keys are looked up in the
//!   store, and the project detail route exposes its primary key as the
//!   project id.
//! - [`PassThroughResolver`] for plain routes: values are used as received.

use std::sync::Arc;

use async_trait::async_trait;
use atrium_core::{is_canonical, IdentifierKind, IdentifierStore};

use super::error::ApiError;
use super::request::AccessCounter;

#[async_trait]
pub trait IdentifierResolver: Send + Sync {
    /// Resolve one raw path value to its canonical form.
    async fn resolve(
        &self,
        kind: IdentifierKind,
        tenant: Option<&str>,
        raw: &str,
        access: &AccessCounter,
    ) -> Result<String, ApiError>;

    /// Whether the route named `project` should expose its primary key as
    /// the project id.
    fn infers_project_from_route(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// AliasResolver
// ---------------------------------------------------------------------------

/// Resolves project keys through the identifier store.
pub struct AliasResolver {
    store: Arc<dyn IdentifierStore>,
}

impl AliasResolver {
    #[must_use]
    pub fn new(store: Arc<dyn IdentifierStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentifierResolver for AliasResolver {
    async fn resolve(
        &self,
        kind: IdentifierKind,
        tenant: Option<&str>,
        raw: &str,
        access: &AccessCounter,
    ) -> Result<String, ApiError> {
        if raw.is_empty() || is_canonical(raw) {
            return Ok(raw.to_string());
        }

        match kind {
            IdentifierKind::Project => {}
            // No alias backend exists for issues yet; keep the raw value.
            IdentifierKind::Issue => return Ok(raw.to_string()),
        }

        let Some(tenant) = tenant else {
            return Err(ApiError::NotFound(format!("{} '{raw}'", kind.as_str())));
        };

        access.record();
        let found = self
            .store
            .lookup_canonical_id(tenant, raw)
            .await
            .map_err(ApiError::Unclassified)?;

        match found {
            Some(id) => {
                tracing::debug!(tenant, alias = raw, id = %id, kind = kind.as_str(), "resolved alias");
                Ok(id)
            }
            None => Err(ApiError::NotFound(format!(
                "{} '{raw}' in tenant '{tenant}'",
                kind.as_str()
            ))),
        }
    }

    fn infers_project_from_route(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// PassThroughResolver
// ---------------------------------------------------------------------------

/// Leaves every identifier exactly as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughResolver;

#[async_trait]
impl IdentifierResolver for PassThroughResolver {
    async fn resolve(
        &self,
        _kind: IdentifierKind,
        _tenant: Option<&str>,
        raw: &str,
        _access: &AccessCounter,
    ) -> Result<String, ApiError> {
        Ok(raw.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
