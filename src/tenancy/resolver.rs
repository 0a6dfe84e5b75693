//! Slug to tenant identity resolution.
//!
//! # Responsibilities
//! - Map a slug (or no slug) to a stable tenant identifier
//! - Issue at most one store query per slug per request
//! - Surface storage failures as errors, never as "unknown tenant"
//!
//! # Design Decisions
//! - Memoization lives in `RequestTenantCache`, an explicit per-request
//!   object carried in request extensions; nothing is cached across requests
//! - Concurrent resolutions of the same slug share one in-flight lookup
//! - Failed lookups are not memoized, so a later caller may retry

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use thiserror::Error;
use tokio::sync::OnceCell;

use crate::observability::metrics;
use crate::tenancy::store::{StoreError, TenantId, TenantRecord, TenantStore};

/// Resolution failed because the store could not answer.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("tenant lookup for '{slug}' failed: {source}")]
    Storage {
        slug: String,
        #[source]
        source: StoreError,
    },
}

type Slot = Arc<OnceCell<Option<TenantRecord>>>;

/// Lookup results memoized for the lifetime of one request.
///
/// Cloning shares the same underlying cache, so a clone stored in request
/// extensions and one held by a handler see the same entries.
#[derive(Debug, Clone, Default)]
pub struct RequestTenantCache {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl RequestTenantCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, slug: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(slug.to_string()).or_default().clone()
    }

    /// Number of slugs with a memoized answer, including unknown tenants.
    /// Failed lookups are not counted.
    pub fn resolved(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.initialized()).count()
    }
}

/// Resolves slugs against a tenant store.
#[derive(Debug, Clone)]
pub struct TenantResolver {
    store: Arc<dyn TenantStore>,
}

impl TenantResolver {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// Resolve a slug to the tenant identifier, memoized in `cache`.
    ///
    /// A `None` slug returns `Ok(None)` without touching the store.
    pub async fn resolve(
        &self,
        cache: &RequestTenantCache,
        slug: Option<&str>,
    ) -> Result<Option<TenantId>, ResolveError> {
        Ok(self.resolve_record(cache, slug).await?.map(|record| record.id))
    }

    /// Like [`resolve`](Self::resolve) but returns the whole tenant record.
    pub async fn resolve_record(
        &self,
        cache: &RequestTenantCache,
        slug: Option<&str>,
    ) -> Result<Option<TenantRecord>, ResolveError> {
        let Some(slug) = slug else {
            return Ok(None);
        };

        let slot = cache.slot(slug);
        let record = slot.get_or_try_init(|| self.lookup(slug)).await?;
        Ok(record.clone())
    }

    async fn lookup(&self, slug: &str) -> Result<Option<TenantRecord>, ResolveError> {
        let start = Instant::now();
        let result = self.store.find_by_slug(slug).await;

        match result {
            Ok(Some(record)) => {
                metrics::record_tenant_lookup("found", start);
                tracing::debug!(slug = %slug, tenant_id = %record.id, "Tenant resolved");
                Ok(Some(record))
            }
            Ok(None) => {
                metrics::record_tenant_lookup("missing", start);
                tracing::debug!(slug = %slug, "No tenant for slug");
                Ok(None)
            }
            Err(source) => {
                metrics::record_tenant_lookup("error", start);
                tracing::error!(slug = %slug, error = %source, "Tenant lookup failed");
                Err(ResolveError::Storage {
                    slug: slug.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Store that counts queries and can be switched into failure mode.
    #[derive(Debug, Default)]
    struct CountingStore {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl TenantStore for CountingStore {
        async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            Ok((slug == "acme").then(|| TenantRecord {
                id: TenantId::from("t_acme"),
                slug: "acme".into(),
                name: "Acme".into(),
                theme: None,
            }))
        }
    }

    fn setup() -> (Arc<CountingStore>, TenantResolver) {
        let store = Arc::new(CountingStore::default());
        let resolver = TenantResolver::new(store.clone());
        (store, resolver)
    }

    #[tokio::test]
    async fn test_no_slug_skips_store() {
        let (store, resolver) = setup();
        let cache = RequestTenantCache::new();

        assert_eq!(resolver.resolve(&cache, None).await.unwrap(), None);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_memoized_within_request() {
        let (store, resolver) = setup();
        let cache = RequestTenantCache::new();

        let first = resolver.resolve(&cache, Some("acme")).await.unwrap();
        let second = resolver.resolve(&cache, Some("acme")).await.unwrap();
        assert_eq!(first, Some(TenantId::from("t_acme")));
        assert_eq!(first, second);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);

        // Unknown tenants are memoized as well.
        assert_eq!(resolver.resolve(&cache, Some("globex")).await.unwrap(), None);
        assert_eq!(resolver.resolve(&cache, Some("globex")).await.unwrap(), None);
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.resolved(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_lookup() {
        let (store, resolver) = setup();
        let cache = RequestTenantCache::new();

        let (a, b) = tokio::join!(
            resolver.resolve(&cache, Some("acme")),
            resolver.resolve(&cache, Some("acme"))
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_does_not_outlive_request() {
        let (store, resolver) = setup();

        resolver.resolve(&RequestTenantCache::new(), Some("acme")).await.unwrap();
        resolver.resolve(&RequestTenantCache::new(), Some("acme")).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_storage_failure_is_an_error_and_not_cached() {
        let (store, resolver) = setup();
        let cache = RequestTenantCache::new();
        store.failing.store(true, Ordering::SeqCst);

        let err = resolver.resolve(&cache, Some("acme")).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Storage { ref slug, source: StoreError::Unavailable(_) } if slug == "acme"
        ));

        store.failing.store(false, Ordering::SeqCst);
        let id = resolver.resolve(&cache, Some("acme")).await.unwrap();
        assert_eq!(id, Some(TenantId::from("t_acme")));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }
}
