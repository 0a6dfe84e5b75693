//! Tenant Gateway
//!
//! Edge service for a multi-tenant learning platform, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request (Host: acme.example.com, GET /courses)
//!         │
//!         ▼
//!  ┌──────────────┐   bypass?   ┌──────────────────────────────┐
//!  │ routing      │────────────▶│ webhook / assets (untouched) │
//!  │ matcher      │             └──────────────────────────────┘
//!  └──────┬───────┘
//!         │ classify host
//!         ▼
//!  ┌──────────────┐  root   ┌───────────────────┐
//!  │ tenancy      │────────▶│ marketing site    │
//!  │ host         │         └───────────────────┘
//!  └──────┬───────┘
//!         │ slug "acme" → rewrite to /s/acme/courses, x-original-path: /courses
//!         ▼
//!  ┌──────────────┐         ┌───────────────────┐
//!  │ handlers     │────────▶│ tenancy resolver  │──▶ TenantStore (memory / HTTP)
//!  │ TenantScope  │         │ (request cache)   │
//!  └──────────────┘         └───────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use tenant_gateway::config::{load_config, watcher::ConfigWatcher, GatewayConfig};
use tenant_gateway::lifecycle::{signals::spawn_signal_handler, Shutdown};
use tenant_gateway::observability::{logging, metrics};
use tenant_gateway::routing::TenantRouter;
use tenant_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "tenant-gateway")]
#[command(about = "Tenant-resolving edge gateway", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a host and path would be routed
    Classify {
        host: String,
        #[arg(default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    if let Some(Commands::Classify { host, path }) = cli.command {
        let router = TenantRouter::from_config(&config);
        let output = serde_json::json!({
            "host": host,
            "class": router.rules().classify(&host),
            "route": router.decide(&host, &path),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("tenant-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        root_domain = %config.tenancy.root_domain,
        store = ?config.store.backend,
        tenants = config.tenants.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Hot reload of host rules; the watcher must outlive the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = HttpServer::from_config(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
