//! Tenant identity subsystem.
//!
//! # Data Flow
//! ```text
//! Host header
//!     → host.rs (classify: root / tenant slug / unrecognized)
//!     → resolver.rs (slug → TenantId, memoized per request)
//!         → store.rs (TenantStore: in-memory or HTTP directory)
//!     → scope.rs (TenantScope handle for handlers)
//!     → scoped.rs (tenant-owned tables, keyed by TenantScope)
//! ```
//!
//! # Design Decisions
//! - Parsing is pure; only the store does I/O
//! - "No such tenant" is a value, store failure is an error
//! - Tenant scoping is enforced by types, not by call-site convention

pub mod context;
pub mod host;
pub mod resolver;
pub mod scope;
pub mod scoped;
pub mod store;

pub use context::RequestContext;
pub use host::{strip_port, HostClass, HostRules};
pub use resolver::{RequestTenantCache, ResolveError, TenantResolver};
pub use scope::TenantScope;
pub use scoped::ScopedTable;
pub use store::{
    HttpTenantStore, InMemoryTenantStore, StoreError, TenantId, TenantRecord, TenantStore,
};
