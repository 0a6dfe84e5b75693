//! Edge routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → matcher.rs (bypass list: webhook, assets, static files)
//!     → router.rs (classify host, rewrite to /<namespace>/<slug><path>)
//!     → Return: RouteDecision (bypass / pass-through / rewrite / misdirected)
//!
//! Router Compilation (at startup and on config reload):
//!     GatewayConfig
//!     → HostRules + BypassList
//!     → Freeze as immutable TenantRouter
//!     → Publish through SharedRouter (arc-swap)
//! ```
//!
//! # Design Decisions
//! - Routers are immutable; reload swaps the whole router atomically
//! - No regex in hot path (suffix/prefix matching only)
//! - Deterministic: same host and path always produce the same decision

pub mod matcher;
pub mod router;

use std::sync::Arc;

use arc_swap::ArcSwap;

pub use matcher::BypassList;
pub use router::{normalize_path, request_host, RouteDecision, TenantRouter};

/// Live router shared by the middleware and the reload task.
pub type SharedRouter = Arc<ArcSwap<TenantRouter>>;

/// Wrap a router for sharing.
pub fn shared(router: TenantRouter) -> SharedRouter {
    Arc::new(ArcSwap::from_pointee(router))
}
