//! Host header classification.
//!
//! # Responsibilities
//! - Strip the port from a host string
//! - Decide whether a host is the root domain, a tenant subdomain, or unrelated
//! - Extract the tenant slug from local, preview and production hosts
//!
//! # Design Decisions
//! - Pure and allocation-light: called on every request
//! - Rules are ordered, first match wins (local, preview, production)
//! - Slug shape is not validated here; unknown slugs fail at resolution
//! - Foreign hosts are reported as `Unrecognized` so callers can choose
//!   between lenient (treat as root) and strict (reject) handling

use serde::Serialize;

use crate::config::TenancyConfig;

const PREVIEW_SEPARATOR: &str = "---";
const LOOPBACK_V6: &str = "[::1]";

/// Classification of a request host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "slug", rename_all = "snake_case")]
pub enum HostClass {
    /// The platform root domain (marketing site).
    Root,
    /// A tenant subdomain carrying the slug.
    Tenant(String),
    /// Neither the root domain nor one of its subdomains.
    Unrecognized,
}

impl HostClass {
    /// The tenant slug, if this host names one.
    pub fn slug(&self) -> Option<&str> {
        match self {
            HostClass::Tenant(slug) => Some(slug),
            _ => None,
        }
    }
}

/// Remove a trailing `:port` from a host. Bracketed IPv6 literals keep their brackets.
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Host classification rules for one root domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRules {
    /// Lowercased, port-stripped root domain.
    root_domain: String,
    /// `www.` + root domain.
    www_domain: String,
    /// Lowercased preview suffix (".vercel.app").
    preview_suffix: String,
}

impl HostRules {
    pub fn new(root_domain: &str, preview_suffix: &str) -> Self {
        let root_domain = strip_port(root_domain.trim()).to_ascii_lowercase();
        Self {
            www_domain: format!("www.{root_domain}"),
            root_domain,
            preview_suffix: preview_suffix.trim().to_ascii_lowercase(),
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Self {
        Self::new(&config.root_domain, &config.preview_suffix)
    }

    /// Root domain without its port.
    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    /// Classify a raw host header value.
    pub fn classify(&self, host: &str) -> HostClass {
        let host = host.trim().to_ascii_lowercase();
        let hostname = strip_port(&host);

        if hostname.is_empty() {
            return HostClass::Unrecognized;
        }

        // Local development: <slug>.localhost, loopback addresses
        if host.contains("localhost") || host.contains("127.0.0.1") || hostname == LOOPBACK_V6 {
            return match hostname.strip_suffix(".localhost") {
                Some(slug) if !slug.is_empty() => HostClass::Tenant(slug.to_string()),
                _ => HostClass::Root,
            };
        }

        // Preview deployments: <slug>---<branch>.vercel.app
        if !self.preview_suffix.is_empty()
            && hostname.contains(PREVIEW_SEPARATOR)
            && hostname.ends_with(&self.preview_suffix)
        {
            return match hostname.split(PREVIEW_SEPARATOR).next() {
                Some(slug) if !slug.is_empty() => HostClass::Tenant(slug.to_string()),
                _ => HostClass::Unrecognized,
            };
        }

        if hostname == self.root_domain || hostname == self.www_domain {
            return HostClass::Root;
        }

        match hostname
            .strip_suffix(self.root_domain.as_str())
            .and_then(|prefix| prefix.strip_suffix('.'))
        {
            Some(slug) if !slug.is_empty() && !self.root_domain.is_empty() => {
                HostClass::Tenant(slug.to_string())
            }
            _ => HostClass::Unrecognized,
        }
    }
}
