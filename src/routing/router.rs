//! Tenant route rewriting.
//!
//! # Responsibilities
//! - Decide, per request, between bypass, pass-through and tenant rewrite
//! - Rewrite tenant requests into `/<namespace>/<slug><path>`
//! - Record the original path in a header and a `RequestContext`
//!
//! # Design Decisions
//! - Immutable after construction; hot reload swaps a whole new router
//! - No I/O and no failure paths: a host that cannot be rewritten is
//!   treated as no tenant
//! - The bypass list runs first so excluded requests are left untouched

use axum::http::header::HOST;
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderName, HeaderValue, Request, Uri};
use serde::Serialize;

use crate::config::{GatewayConfig, TenancyConfig};
use crate::routing::matcher::BypassList;
use crate::tenancy::context::RequestContext;
use crate::tenancy::host::{HostClass, HostRules};

const DEFAULT_ORIGINAL_PATH_HEADER: &str = "x-original-path";

/// Normalize a tenant path: `/` becomes empty, trailing slashes are dropped.
pub fn normalize_path(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Excluded by the bypass list; forwarded untouched.
    Bypass,
    /// Root domain (or unrecognized host in lenient mode); forwarded unchanged.
    PassThrough,
    /// Rewritten into the tenant route tree.
    Rewrite { slug: String, target: String },
    /// Unrecognized host rejected in strict mode.
    Misdirected,
}

impl RouteDecision {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            RouteDecision::Bypass => "bypass",
            RouteDecision::PassThrough => "pass_through",
            RouteDecision::Rewrite { .. } => "rewrite",
            RouteDecision::Misdirected => "misdirected",
        }
    }
}

/// Edge router compiled from configuration.
#[derive(Debug)]
pub struct TenantRouter {
    rules: HostRules,
    tenancy: TenancyConfig,
    header: HeaderName,
    bypass: BypassList,
}

impl TenantRouter {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let header = HeaderName::from_bytes(config.tenancy.original_path_header.as_bytes())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    header = %config.tenancy.original_path_header,
                    "Invalid original path header name, using default"
                );
                HeaderName::from_static(DEFAULT_ORIGINAL_PATH_HEADER)
            });

        Self {
            rules: HostRules::from_config(&config.tenancy),
            tenancy: config.tenancy.clone(),
            header,
            bypass: BypassList::from_config(&config.bypass),
        }
    }

    pub fn rules(&self) -> &HostRules {
        &self.rules
    }

    pub fn tenancy(&self) -> &TenancyConfig {
        &self.tenancy
    }

    /// Name of the header carrying the pre-rewrite path.
    pub fn original_path_header(&self) -> &HeaderName {
        &self.header
    }

    /// Path inside the tenant route tree for `slug` and a requested path.
    pub fn rewrite_target(&self, slug: &str, path: &str) -> String {
        format!(
            "/{}/{}{}",
            self.tenancy.tenant_namespace,
            slug,
            normalize_path(path)
        )
    }

    /// Pure routing decision for a host and path.
    pub fn decide(&self, host: &str, path: &str) -> RouteDecision {
        if self.bypass.matches(path) {
            return RouteDecision::Bypass;
        }
        self.decide_class(&self.rules.classify(host), path)
    }

    fn decide_class(&self, class: &HostClass, path: &str) -> RouteDecision {
        match class {
            HostClass::Tenant(slug) => RouteDecision::Rewrite {
                slug: slug.clone(),
                target: self.rewrite_target(slug, path),
            },
            HostClass::Unrecognized if self.tenancy.strict_hosts => RouteDecision::Misdirected,
            HostClass::Root | HostClass::Unrecognized => RouteDecision::PassThrough,
        }
    }

    /// Route a request in place.
    ///
    /// Rewrites the URI for tenant hosts, adds the original-path header and
    /// inserts a [`RequestContext`] for every request that is not bypassed.
    pub fn apply<B>(&self, req: &mut Request<B>) -> RouteDecision {
        let path = req.uri().path().to_string();
        if self.bypass.matches(&path) {
            return RouteDecision::Bypass;
        }

        let host = request_host(req).unwrap_or_default().to_string();
        let mut class = self.rules.classify(&host);
        let mut decision = self.decide_class(&class, &path);

        let rewritten = match &decision {
            RouteDecision::Rewrite { target, .. } => Some(rewrite_uri(req.uri(), target)),
            _ => None,
        };

        match rewritten {
            Some(Some(uri)) => {
                *req.uri_mut() = uri;
                if let Ok(value) = HeaderValue::from_str(&path) {
                    req.headers_mut().insert(self.header.clone(), value);
                }
            }
            Some(None) => {
                tracing::warn!(host = %host, "Host does not form a valid tenant path, treating as no tenant");
                class = HostClass::Unrecognized;
                decision = self.decide_class(&class, &path);
            }
            None => {}
        }

        req.extensions_mut()
            .insert(RequestContext::new(host, class, path));
        decision
    }
}

/// Host of a request: the `Host` header, or the URI authority (HTTP/2).
pub fn request_host<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
}

fn rewrite_uri(uri: &Uri, target: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{target}?{query}"),
        None => target.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}
