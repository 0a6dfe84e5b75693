//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the tenant gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Host classification and rewrite settings.
    pub tenancy: TenancyConfig,

    /// Paths that are never intercepted by the tenant rewrite.
    pub bypass: BypassConfig,

    /// Where tenant identities are looked up.
    pub store: StoreConfig,

    /// Tenants served by the in-memory store.
    pub tenants: Vec<TenantSeed>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum requests processed concurrently (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Tenant host classification and route rewriting.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TenancyConfig {
    /// Platform root domain, optionally with a port ("example.com", "localhost:3000").
    pub root_domain: String,

    /// Scheme used when building absolute tenant URLs ("http" or "https").
    pub protocol: String,

    /// First path segment of the tenant route tree (`/<namespace>/<slug>/...`).
    pub tenant_namespace: String,

    /// Domain suffix of preview deployments (`<slug>---<branch>.<suffix>`).
    pub preview_suffix: String,

    /// Header carrying the path as it was before the rewrite.
    pub original_path_header: String,

    /// Reject hosts that are neither the root domain nor one of its subdomains.
    pub strict_hosts: bool,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            root_domain: "localhost:3000".to_string(),
            protocol: "http".to_string(),
            tenant_namespace: "s".to_string(),
            preview_suffix: ".vercel.app".to_string(),
            original_path_header: "x-original-path".to_string(),
            strict_hosts: false,
        }
    }
}

/// Static exclusion list evaluated before any rewrite.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BypassConfig {
    /// Paths matched exactly (payment webhook, health check).
    pub exact_paths: Vec<String>,

    /// Path prefixes matched on segment boundaries (framework assets).
    pub prefixes: Vec<String>,

    /// File extensions served as static assets (`/favicon.ico`, `/logo.png`).
    /// Matched case-insensitively on the last path segment; empty disables
    /// the rule. `js` is not listed: bundles are served under the asset
    /// prefixes, and a course key such as `vue.js` is a tenant page.
    pub static_extensions: Vec<String>,
}

impl Default for BypassConfig {
    fn default() -> Self {
        Self {
            exact_paths: vec![
                "/api/webhooks/stripe".to_string(),
                "/healthz".to_string(),
            ],
            prefixes: vec!["/_assets".to_string(), "/_internal".to_string()],
            static_extensions: [
                "ico", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "css", "map",
                "txt", "xml", "webmanifest", "woff", "woff2",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Which tenant store backs identity resolution.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Tenants seeded from the `[[tenants]]` tables.
    #[default]
    Memory,
    /// Remote tenant directory reached over HTTP.
    Http,
}

/// Tenant store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Base URL of the tenant directory (`GET {url}/tenants/{slug}`).
    pub directory_url: String,

    /// Per-lookup timeout for the HTTP directory in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            directory_url: String::new(),
            request_timeout_ms: 2_000,
        }
    }
}

/// A tenant provisioned at start-up for the in-memory store.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TenantSeed {
    /// Stable internal identifier.
    pub id: String,

    /// Subdomain label.
    pub slug: String,

    /// Display name.
    pub name: String,

    #[serde(default)]
    pub theme: Option<String>,

    /// Tenant-owned catalog entries.
    #[serde(default)]
    pub catalog: Vec<CatalogSeed>,
}

/// A catalog entry owned by a seeded tenant.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CatalogSeed {
    pub key: String,
    pub title: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
