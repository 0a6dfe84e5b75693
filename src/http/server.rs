//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum handler tree (marketing, bypass targets, tenant tree)
//! - Put the tenant rewrite in front of routing
//! - Wire up middleware (tracing, request id, timeout, limits)
//! - Apply config reloads to the live tenant router
//! - Serve until the shutdown signal fires

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::SessionStore;
use crate::config::{GatewayConfig, StoreBackend};
use crate::http::handlers::{self, AppState, CatalogEntry};
use crate::http::middleware::tenant_rewrite_middleware;
use crate::lifecycle::ShutdownSignal;
use crate::routing::{self, SharedRouter, TenantRouter};
use crate::tenancy::{
    HttpTenantStore, InMemoryTenantStore, ScopedTable, StoreError, TenantRecord,
    TenantResolver, TenantScope, TenantStore,
};

/// Build the tenant store selected by configuration.
pub fn build_store(config: &GatewayConfig) -> Result<Arc<dyn TenantStore>, StoreError> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryTenantStore::from_seeds(&config.tenants))),
        StoreBackend::Http => {
            let base = url::Url::parse(&config.store.directory_url).map_err(|e| {
                StoreError::Unavailable(format!(
                    "invalid directory url '{}': {}",
                    config.store.directory_url, e
                ))
            })?;
            let store = HttpTenantStore::new(
                base,
                Duration::from_millis(config.store.request_timeout_ms),
            )?;
            tracing::info!(url = %config.store.directory_url, "Using HTTP tenant directory");
            Ok(Arc::new(store))
        }
    }
}

/// HTTP server for the tenant gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    routes: SharedRouter,
}

impl HttpServer {
    /// Create a server with the store selected by configuration.
    pub fn from_config(config: GatewayConfig) -> Result<Self, StoreError> {
        let store = build_store(&config)?;
        Ok(Self::new(config, store))
    }

    /// Create a server backed by the given tenant store.
    pub fn new(config: GatewayConfig, store: Arc<dyn TenantStore>) -> Self {
        let routes = routing::shared(TenantRouter::from_config(&config));

        let state = AppState {
            resolver: TenantResolver::new(store),
            routes: routes.clone(),
            catalog: Arc::new(seed_catalog(&config)),
            sessions: Arc::new(SessionStore::new()),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Middleware added with `Router::layer` runs after route matching, so
    /// the handler tree sits behind a fallback of an outer router whose
    /// layers (including the rewrite) run first.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let routes = state.routes.clone();

        let app = Router::new()
            .route("/", get(handlers::marketing))
            .route("/healthz", get(handlers::healthz))
            .route("/api/webhooks/stripe", post(handlers::payment_webhook))
            .route("/s/{slug}", get(handlers::storefront))
            .route("/s/{slug}/courses", get(handlers::list_courses))
            .route("/s/{slug}/courses/{key}", get(handlers::get_course))
            .route(
                "/s/{slug}/api/auth/session",
                get(handlers::current_session)
                    .post(handlers::create_session)
                    .delete(handlers::end_session),
            )
            .route("/s/{slug}/{*rest}", any(handlers::tenant_page))
            .fallback(handlers::not_found)
            .with_state(state);

        Router::new()
            .fallback_service(app)
            .layer(middleware::from_fn_with_state(routes, tenant_rewrite_middleware))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for serving or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live tenant router.
    pub fn routes(&self) -> SharedRouter {
        self.routes.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the live tenant router.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root_domain = %self.config.tenancy.root_domain,
            "HTTP server starting"
        );

        let routes = self.routes.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                routes.store(Arc::new(TenantRouter::from_config(&new_config)));
                tracing::info!(
                    root_domain = %new_config.tenancy.root_domain,
                    strict_hosts = new_config.tenancy.strict_hosts,
                    "Tenant routing reloaded"
                );
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

fn seed_catalog(config: &GatewayConfig) -> ScopedTable<CatalogEntry> {
    let catalog = ScopedTable::new();
    for seed in &config.tenants {
        let scope = TenantScope::new(&TenantRecord::from(seed));
        for entry in &seed.catalog {
            catalog.insert(
                &scope,
                entry.key.clone(),
                CatalogEntry {
                    key: entry.key.clone(),
                    title: entry.title.clone(),
                },
            );
        }
    }
    catalog
}
