//! Typed tenant scope.
//!
//! # Responsibilities
//! - Represent "this request acts on behalf of tenant X"
//! - Derive the scope from the request host: host → slug → tenant id
//!
//! # Design Decisions
//! - The constructor is crate-private: outside this crate a `TenantScope`
//!   only exists as the result of resolving a request, so tenant-owned
//!   data cannot be reached without one
//! - Unknown tenants reject with 404, store failures with 503

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::http::error::AppError;
use crate::tenancy::context::RequestContext;
use crate::tenancy::resolver::TenantResolver;
use crate::tenancy::store::{TenantId, TenantRecord};

/// Proof that a request was resolved to a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    tenant_id: TenantId,
    slug: String,
    name: String,
    theme: Option<String>,
}

impl TenantScope {
    pub(crate) fn new(record: &TenantRecord) -> Self {
        Self {
            tenant_id: record.id.clone(),
            slug: record.slug.clone(),
            name: record.name.clone(),
            theme: record.theme.clone(),
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    /// Resolve the tenant named by the request host.
    pub async fn resolve(
        resolver: &TenantResolver,
        ctx: &RequestContext,
    ) -> Result<Self, AppError> {
        let slug = ctx.slug().ok_or(AppError::NoTenant)?;
        let record = resolver
            .resolve_record(&ctx.cache, Some(slug))
            .await?
            .ok_or_else(|| AppError::TenantNotFound(slug.to_string()))?;
        Ok(Self::new(&record))
    }
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
    TenantResolver: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state).await?;
        let resolver = TenantResolver::from_ref(state);
        Self::resolve(&resolver, &ctx).await
    }
}
