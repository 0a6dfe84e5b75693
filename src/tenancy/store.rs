//! Tenant storage backends.
//!
//! # Responsibilities
//! - Define the tenant record and its stable identifier
//! - Look tenants up by slug (the only query this service issues)
//! - Report storage failures distinctly from "no such tenant"
//!
//! # Design Decisions
//! - `TenantStore` is the seam to persistent storage; the in-memory store
//!   serves seeded tenants, the HTTP store talks to a tenant directory
//! - Slugs are compared lowercased, matching host classification
//! - Read-only from this service's point of view, except for provisioning
//!   helpers used at start-up and in tests

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::TenantSeed;

/// Stable, opaque tenant identifier. Never changes when a slug is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One customer organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub id: TenantId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub theme: Option<String>,
}

impl From<&TenantSeed> for TenantRecord {
    fn from(seed: &TenantSeed) -> Self {
        Self {
            id: TenantId::new(seed.id.clone()),
            slug: seed.slug.to_ascii_lowercase(),
            name: seed.name.clone(),
            theme: seed.theme.clone(),
        }
    }
}

/// Errors raised by a tenant store. "Not found" is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection refused, reset, or an unexpected status from the backend.
    #[error("tenant store unavailable: {0}")]
    Unavailable(String),

    /// The lookup did not finish in time.
    #[error("tenant store timed out after {0} ms")]
    Timeout(u64),

    /// The backend answered with something that is not a tenant record.
    #[error("malformed tenant record: {0}")]
    Malformed(String),
}

/// Persistent tenant lookup keyed on the unique slug.
#[async_trait]
pub trait TenantStore: Send + Sync + fmt::Debug {
    /// Find the tenant currently owning `slug`.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantRecord>, StoreError>;
}

/// Tenants held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    by_slug: DashMap<String, TenantRecord>,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds(seeds: &[TenantSeed]) -> Self {
        let store = Self::new();
        for seed in seeds {
            store.upsert(TenantRecord::from(seed));
        }
        tracing::info!(tenants = store.len(), "Loaded tenant seeds");
        store
    }

    /// Insert or update a tenant. A renamed tenant releases its previous slug.
    pub fn upsert(&self, mut record: TenantRecord) {
        record.slug = record.slug.to_ascii_lowercase();
        self.by_slug
            .retain(|slug, existing| existing.id != record.id || *slug == record.slug);
        self.by_slug.insert(record.slug.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantRecord>, StoreError> {
        Ok(self
            .by_slug
            .get(&slug.to_ascii_lowercase())
            .map(|r| r.value().clone()))
    }
}

/// Tenant directory reached over HTTP: `GET {base}/tenants/{slug}`.
///
/// `200` carries a JSON [`TenantRecord`], `404` means no such tenant, and
/// anything else is a storage failure.
#[derive(Debug, Clone)]
pub struct HttpTenantStore {
    base: Url,
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpTenantStore {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, StoreError> {
        if base.cannot_be_a_base() {
            return Err(StoreError::Unavailable(format!(
                "directory url {base} cannot be a base"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            base,
            client,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    fn tenant_url(&self, slug: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("tenants").push(slug);
        }
        url
    }
}

#[async_trait]
impl TenantStore for HttpTenantStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantRecord>, StoreError> {
        let url = self.tenant_url(slug);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout_ms)
            } else {
                StoreError::Unavailable(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let record = response.json::<TenantRecord>().await.map_err(|e| {
                    if e.is_timeout() {
                        StoreError::Timeout(self.timeout_ms)
                    } else {
                        StoreError::Malformed(e.to_string())
                    }
                })?;
                if !record.slug.eq_ignore_ascii_case(slug) {
                    tracing::warn!(url = %url, requested = %slug, returned = %record.slug, "Tenant directory answered for another slug");
                    return Err(StoreError::Malformed(format!(
                        "asked for tenant '{slug}', directory returned '{}'",
                        record.slug
                    )));
                }
                Ok(Some(record))
            }
            status => {
                tracing::warn!(url = %url, status = %status, "Tenant directory returned an error");
                Err(StoreError::Unavailable(format!(
                    "directory returned {status}"
                )))
            }
        }
    }
}
