//! In-memory [`IdentifierStore`] backed by [`DashMap`].

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use atrium_core::IdentifierStore;
use dashmap::DashMap;

/// Maps `(tenant, alias key)` pairs to canonical ids.
///
/// Keys are exact-match: `ENG` and `eng` are different aliases.
pub struct MemoryIdentifierStore {
    entries: DashMap<(String, String), String>,
    lookups: AtomicU64,
}

impl MemoryIdentifierStore {
    /// Creates a new, empty `MemoryIdentifierStore`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            lookups: AtomicU64::new(0),
        }
    }

    /// Registers an alias, replacing any previous mapping for the same key.
    pub fn insert(&self, tenant: &str, key: &str, canonical_id: &str) -> Option<String> {
        self.entries
            .insert((tenant.to_string(), key.to_string()), canonical_id.to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups served so far, hits and misses alike.
    #[must_use]
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Default for MemoryIdentifierStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentifierStore for MemoryIdentifierStore {
    async fn lookup_canonical_id(&self, tenant: &str, key: &str) -> anyhow::Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .entries
            .get(&(tenant.to_string(), key.to_string()))
            .map(|id| id.value().clone()))
    }
}
