//! Tenant edge gateway for a multi-tenant learning platform.
//!
//! Resolves the tenant named by the request host, rewrites tenant requests
//! into the `/s/{slug}` route tree and hands handlers a typed tenant scope.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod tenancy;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
