use async_trait::async_trait;

/// Read-only access to the (tenant, alias) -> canonical id relation owned by
/// the resource store.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    /// Look up the canonical id for a human-readable key within a tenant.
    ///
    /// `Ok(None)` means the alias does not exist in that tenant. `Err` is
    /// reserved for backend failures and must not be used for absence.
    async fn lookup_canonical_id(&self, tenant: &str, key: &str) -> anyhow::Result<Option<String>>;
}

/// Sink for failures worth a server-side record.
///
/// Fire-and-forget: implementations swallow their own failures, and callers
/// never let a misbehaving logger affect the response.
pub trait ExceptionLogger: Send + Sync {
    fn log_exception(&self, error: &(dyn std::error::Error + Send + Sync + 'static));
}
