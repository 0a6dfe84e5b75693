//! Tenant-owned tables.

use std::collections::BTreeMap;

use dashmap::DashMap;

use crate::tenancy::scope::TenantScope;
use crate::tenancy::store::TenantId;

/// Records owned by tenants, partitioned by tenant identifier.
///
/// Every operation takes a [`TenantScope`]; there is no way to read or
/// write a row without naming the tenant that owns it.
#[derive(Debug)]
pub struct ScopedTable<V> {
    rows: DashMap<TenantId, BTreeMap<String, V>>,
}

impl<V> Default for ScopedTable<V> {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }
}

impl<V: Clone> ScopedTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, returning the previous value under the same key.
    pub fn insert(&self, scope: &TenantScope, key: impl Into<String>, value: V) -> Option<V> {
        self.rows
            .entry(scope.tenant_id().clone())
            .or_default()
            .insert(key.into(), value)
    }

    pub fn get(&self, scope: &TenantScope, key: &str) -> Option<V> {
        self.rows
            .get(scope.tenant_id())
            .and_then(|rows| rows.get(key).cloned())
    }

    pub fn remove(&self, scope: &TenantScope, key: &str) -> Option<V> {
        self.rows
            .get_mut(scope.tenant_id())
            .and_then(|mut rows| rows.remove(key))
    }

    /// All rows of the tenant, ordered by key.
    pub fn list(&self, scope: &TenantScope) -> Vec<(String, V)> {
        self.rows
            .get(scope.tenant_id())
            .map(|rows| {
                rows.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, scope: &TenantScope) -> usize {
        self.rows
            .get(scope.tenant_id())
            .map(|rows| rows.len())
            .unwrap_or(0)
    }
}
