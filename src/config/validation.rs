//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check tenant seeds for duplicate slugs and identifiers
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, StoreBackend};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("tenancy.root_domain must not be empty")]
    EmptyRootDomain,

    #[error("tenancy.protocol must be \"http\" or \"https\", got \"{0}\"")]
    InvalidProtocol(String),

    #[error("tenancy.tenant_namespace \"{0}\" must be a single non-empty path segment")]
    InvalidNamespace(String),

    #[error("tenancy.original_path_header \"{0}\" is not a valid header name")]
    InvalidHeaderName(String),

    #[error("bypass path \"{0}\" must start with '/'")]
    InvalidBypassPath(String),

    #[error("bypass.static_extensions entry \"{0}\" must be alphanumeric without a leading dot")]
    InvalidStaticExtension(String),

    #[error("listener.bind_address \"{0}\" is not a socket address")]
    InvalidBindAddress(String),

    #[error("store.directory_url is required for the http backend")]
    MissingDirectoryUrl,

    #[error("store.directory_url \"{0}\" is not a valid URL")]
    InvalidDirectoryUrl(String),

    #[error("tenant slug \"{0}\" is empty or declared more than once")]
    DuplicateSlug(String),

    #[error("tenant id \"{0}\" is empty or declared more than once")]
    DuplicateTenantId(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let tenancy = &config.tenancy;

    if tenancy.root_domain.trim().is_empty() {
        errors.push(ValidationError::EmptyRootDomain);
    }

    if !matches!(tenancy.protocol.as_str(), "http" | "https") {
        errors.push(ValidationError::InvalidProtocol(tenancy.protocol.clone()));
    }

    let ns = &tenancy.tenant_namespace;
    if ns.is_empty() || ns.contains('/') || ns.contains('?') {
        errors.push(ValidationError::InvalidNamespace(ns.clone()));
    }

    if HeaderName::from_bytes(tenancy.original_path_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            tenancy.original_path_header.clone(),
        ));
    }

    for path in config.bypass.exact_paths.iter().chain(&config.bypass.prefixes) {
        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidBypassPath(path.clone()));
        }
    }

    for ext in &config.bypass.static_extensions {
        if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
            errors.push(ValidationError::InvalidStaticExtension(ext.clone()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero("listener.max_connections"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if config.store.backend == StoreBackend::Http {
        if config.store.directory_url.is_empty() {
            errors.push(ValidationError::MissingDirectoryUrl);
        } else if url::Url::parse(&config.store.directory_url).is_err() {
            errors.push(ValidationError::InvalidDirectoryUrl(
                config.store.directory_url.clone(),
            ));
        }
        if config.store.request_timeout_ms == 0 {
            errors.push(ValidationError::Zero("store.request_timeout_ms"));
        }
    }

    let mut slugs = HashSet::new();
    let mut ids = HashSet::new();
    for tenant in &config.tenants {
        let slug = tenant.slug.to_ascii_lowercase();
        if slug.is_empty() || !slugs.insert(slug) {
            errors.push(ValidationError::DuplicateSlug(tenant.slug.clone()));
        }
        if tenant.id.is_empty() || !ids.insert(tenant.id.as_str()) {
            errors.push(ValidationError::DuplicateTenantId(tenant.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
