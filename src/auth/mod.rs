//! Tenant-scoped authentication.
//!
//! Authentication always runs against a resolved `TenantScope`; the
//! session store and cookie settings are both derived from it.

pub mod session;

pub use session::{Session, SessionConfig, SessionStore};
