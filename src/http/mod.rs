//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, trace, timeout, concurrency limit)
//!     → middleware/tenant_rewrite.rs (routing::TenantRouter)
//!     → handlers.rs (marketing, bypass targets, /s/{slug} tree)
//!         → TenantScope extractor (tenancy::resolver)
//!     → error.rs (AppError → status + JSON body)
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::AppError;
pub use handlers::AppState;
pub use server::{build_store, HttpServer};
