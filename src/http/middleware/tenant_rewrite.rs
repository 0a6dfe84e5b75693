//! Tenant rewrite middleware.
//! Routes every request through the live `TenantRouter` before the handler tree sees it.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::AppError;
use crate::observability::metrics;
use crate::routing::{request_host, RouteDecision, SharedRouter};

pub async fn tenant_rewrite_middleware(
    State(router): State<SharedRouter>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let router = router.load_full();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let decision = router.apply(&mut req);
    metrics::record_route_decision(decision.label());

    match &decision {
        RouteDecision::Misdirected => {
            let host = request_host(&req).unwrap_or_default().to_string();
            tracing::warn!(host = %host, path = %path, "Rejected unrecognized host");
            return AppError::MisdirectedHost(host).into_response();
        }
        RouteDecision::Rewrite { slug, target } => {
            tracing::debug!(method = %method, slug = %slug, path = %path, target = %target, "Rewrote tenant request");
        }
        RouteDecision::PassThrough | RouteDecision::Bypass => {
            tracing::trace!(method = %method, path = %path, decision = decision.label(), "Request not rewritten");
        }
    }

    next.run(req).await
}
