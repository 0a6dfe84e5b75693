//! Per-request tenant context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::http::error::AppError;
use crate::tenancy::host::HostClass;
use crate::tenancy::resolver::RequestTenantCache;

/// What the edge router learned about a request before handing it on.
///
/// Built once by the router, stored in request extensions and dropped with
/// the request. Carries the request-scoped tenant cache so every resolution
/// made while serving the request shares it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Raw host as received.
    pub host: String,
    pub class: HostClass,
    /// Path before any rewrite.
    pub original_path: String,
    pub cache: RequestTenantCache,
}

impl RequestContext {
    pub fn new(host: impl Into<String>, class: HostClass, original_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            class,
            original_path: original_path.into(),
            cache: RequestTenantCache::new(),
        }
    }

    pub fn slug(&self) -> Option<&str> {
        self.class.slug()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(AppError::MissingContext)
    }
}
