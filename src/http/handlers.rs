//! Request handlers.
//!
//! Root-domain handlers serve the marketing site and the bypass targets.
//! Everything under `/s/{slug}` is the tenant route tree; those handlers
//! take a `TenantScope`, which resolves the tenant from the request host
//! (never from the path) before the handler body runs.

use axum::{
    body::Bytes,
    extract::{FromRef, Path, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{SessionConfig, SessionStore};
use crate::http::error::AppError;
use crate::routing::SharedRouter;
use crate::tenancy::{ScopedTable, TenantResolver, TenantScope};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: TenantResolver,
    pub routes: SharedRouter,
    pub catalog: Arc<ScopedTable<CatalogEntry>>,
    pub sessions: Arc<SessionStore>,
}

impl FromRef<AppState> for TenantResolver {
    fn from_ref(state: &AppState) -> Self {
        state.resolver.clone()
    }
}

/// A course listing owned by one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub key: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct NewSession {
    pub user: String,
}

#[derive(Serialize)]
pub struct TenantPage {
    pub tenant_id: String,
    pub slug: String,
    pub name: String,
    pub theme: Option<String>,
    /// Path as requested on the tenant host.
    pub path: String,
}

impl TenantPage {
    fn new(scope: &TenantScope, path: String) -> Self {
        Self {
            tenant_id: scope.tenant_id().to_string(),
            slug: scope.slug().to_string(),
            name: scope.name().to_string(),
            theme: scope.theme().map(str::to_string),
            path,
        }
    }
}

/// Path the client asked for, recovered from the rewrite header.
fn original_path(state: &AppState, headers: &HeaderMap) -> String {
    let router = state.routes.load();
    headers
        .get(router.original_path_header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("/")
        .to_string()
}

pub async fn marketing(State(state): State<AppState>) -> Json<serde_json::Value> {
    let router = state.routes.load();
    let tenancy = router.tenancy();
    Json(serde_json::json!({
        "site": "marketing",
        "root_domain": tenancy.root_domain,
        "url": format!("{}://{}", tenancy.protocol, tenancy.root_domain),
    }))
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Payment provider webhook. Reached untouched thanks to the bypass list,
/// so the raw body is still valid for signature verification downstream.
pub async fn payment_webhook(headers: HeaderMap, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let signed = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.is_empty());
    if !signed {
        return Err(AppError::BadRequest("missing stripe-signature header".into()));
    }

    tracing::info!(bytes = body.len(), "Payment webhook received");
    Ok(Json(serde_json::json!({ "received": true, "bytes": body.len() })))
}

pub async fn storefront(
    scope: TenantScope,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let page = TenantPage::new(&scope, original_path(&state, &headers));
    Json(serde_json::json!({
        "page": "storefront",
        "tenant": page,
        "courses": state.catalog.count(&scope),
    }))
}

pub async fn list_courses(
    scope: TenantScope,
    State(state): State<AppState>,
) -> Json<Vec<CatalogEntry>> {
    Json(
        state
            .catalog
            .list(&scope)
            .into_iter()
            .map(|(_, entry)| entry)
            .collect(),
    )
}

pub async fn get_course(
    scope: TenantScope,
    State(state): State<AppState>,
    Path((_slug, key)): Path<(String, String)>,
) -> Result<Json<CatalogEntry>, AppError> {
    state
        .catalog
        .get(&scope, &key)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("course '{key}'")))
}

pub async fn create_session(
    scope: TenantScope,
    State(state): State<AppState>,
    Json(body): Json<NewSession>,
) -> Result<impl IntoResponse, AppError> {
    let user = body.user.trim();
    if user.is_empty() {
        return Err(AppError::BadRequest("user must not be empty".into()));
    }

    let config = SessionConfig::for_tenant(&scope, state.routes.load().tenancy());
    let token = state.sessions.issue(&scope, user);
    let session = state
        .sessions
        .lookup(&scope, &token)
        .ok_or(AppError::Unauthorized)?;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, config.set_cookie(&token))],
        Json(session),
    ))
}

pub async fn current_session(
    scope: TenantScope,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let config = SessionConfig::for_tenant(&scope, state.routes.load().tenancy());
    let token = config.read_token(&headers).ok_or(AppError::Unauthorized)?;
    state
        .sessions
        .lookup(&scope, token)
        .map(Json)
        .ok_or(AppError::Unauthorized)
}

pub async fn end_session(
    scope: TenantScope,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let config = SessionConfig::for_tenant(&scope, state.routes.load().tenancy());
    if let Some(token) = config.read_token(&headers) {
        state.sessions.revoke(&scope, token);
    }
    (StatusCode::NO_CONTENT, [(SET_COOKIE, config.clear_cookie())])
}

/// Any other page of the tenant route tree.
pub async fn tenant_page(
    scope: TenantScope,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let page = TenantPage::new(&scope, original_path(&state, &headers));
    Json(serde_json::json!({ "page": "tenant", "tenant": page }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("page".into())
}
