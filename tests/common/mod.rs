//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Path;
use axum::http::{header::HOST, HeaderMap, Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use tokio::net::TcpListener;
use tower::ServiceExt;

use tenant_gateway::config::{CatalogSeed, GatewayConfig, TenantSeed};
use tenant_gateway::tenancy::{InMemoryTenantStore, StoreError, TenantRecord, TenantStore};
use tenant_gateway::HttpServer;

/// Gateway config for `example.com` with two seeded tenants.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.tenancy.root_domain = "example.com".into();
    config.tenants = vec![
        TenantSeed {
            id: "t_acme".into(),
            slug: "acme".into(),
            name: "Acme Academy".into(),
            theme: Some("indigo".into()),
            catalog: vec![
                CatalogSeed { key: "rust-101".into(), title: "Rust 101".into() },
                CatalogSeed { key: "async-201".into(), title: "Async Rust".into() },
            ],
        },
        TenantSeed {
            id: "t_globex".into(),
            slug: "globex".into(),
            name: "Globex University".into(),
            theme: None,
            catalog: vec![CatalogSeed {
                key: "ledger-101".into(),
                title: "Bookkeeping Basics".into(),
            }],
        },
    ];
    config
}

/// In-memory store that counts queries and can be told to fail.
#[derive(Debug)]
pub struct FlakyStore {
    inner: InMemoryTenantStore,
    pub calls: AtomicUsize,
    pub failing: AtomicBool,
}

impl FlakyStore {
    pub fn new(config: &GatewayConfig) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryTenantStore::from_seeds(&config.tenants),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TenantStore for FlakyStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantRecord>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset by peer".into()));
        }
        self.inner.find_by_slug(slug).await
    }
}

/// A server over `config` backed by a fresh `FlakyStore`.
pub fn gateway(config: GatewayConfig) -> (HttpServer, Arc<FlakyStore>) {
    let store = FlakyStore::new(&config);
    let server = HttpServer::new(config, store.clone());
    (server, store)
}

pub fn request(method: Method, host: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(HOST, host)
        .body(Body::empty())
        .unwrap()
}

pub fn get_req(host: &str, uri: &str) -> Request<Body> {
    request(Method::GET, host, uri)
}

/// Drive one request through the router; the body is parsed as JSON when possible.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()));
    (status, headers, body)
}

/// Start a mock tenant directory on an ephemeral port.
///
/// `acme` exists, `broken` answers 500, `garbled` answers non-JSON,
/// `slow` takes two seconds, `impostor` answers with acme's record,
/// everything else is 404.
pub async fn start_mock_directory() -> SocketAddr {
    async fn tenant(Path(slug): Path<String>) -> axum::response::Response {
        match slug.as_str() {
            "acme" | "impostor" => Json(serde_json::json!({
                "id": "t_acme",
                "slug": "acme",
                "name": "Acme Academy",
            }))
            .into_response(),
            "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            "garbled" => (StatusCode::OK, "<html>oops</html>").into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                StatusCode::NOT_FOUND.into_response()
            }
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    let app = Router::new().route("/tenants/{slug}", get(tenant));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
