//! Request middleware.

pub mod tenant_rewrite;

pub use tenant_rewrite::tenant_rewrite_middleware;
