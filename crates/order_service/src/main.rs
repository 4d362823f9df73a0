//! Order service entry point.
//!
//! Consumes orders from JetStream, persists them and serves them over HTTP
//! through a read-through cache.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use nats_client::NatsClient;
use order_service::{
    create_router, AppState, InMemoryStore, IngestionListener, OrderCache, OrderService,
    OrderStore, PostgresStore, ServiceConfig,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting order service...");

    let config = ServiceConfig::from_env()?;

    // Initialize Prometheus metrics
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()?;

    info!(
        "Prometheus metrics available at http://0.0.0.0:{}/metrics",
        config.metrics_port
    );

    // Storage
    let store: Arc<dyn OrderStore> = match &config.postgres {
        Some(pg) => {
            info!("Connecting to Postgres...");
            Arc::new(PostgresStore::connect(pg).await?)
        }
        None => {
            warn!("DATABASE_URL not set, orders will not survive a restart");
            Arc::new(InMemoryStore::new())
        }
    };
    store
        .ensure_schema()
        .await
        .context("prepare storage schema")?;
    info!("Storage ready ({})", store.backend_name());

    let service = OrderService::new(store, OrderCache::new());

    match service.warm_cache().await {
        Ok(loaded) => info!("Loaded {} orders into cache", loaded),
        Err(e) => error!("Cache warm-up failed, continuing with cold cache: {}", e),
    }

    // Connect to NATS
    info!("Connecting to NATS at {}...", config.nats_url);
    let nats_client = NatsClient::connect_with_name(&config.nats_url, "order-service").await?;
    info!("Connected to NATS");

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    let subject = config.listener.subject.clone();
    let listener = IngestionListener::new(
        service.clone(),
        nats_client,
        config.listener.clone(),
        shutdown_rx,
    );

    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            error!("IngestionListener failed: {:?}", e);
        }
    });

    info!("IngestionListener spawned, consuming '{}'", subject);

    // Create HTTP server
    let app_state = AppState {
        service,
        static_dir: config.static_dir.clone(),
    };
    let router = create_router(app_state);

    let tcp = tokio::net::TcpListener::bind(config.http_bind).await?;
    info!("HTTP API listening on http://{}", config.http_bind);
    info!("Available endpoints:");
    info!("  GET /health              - Health check");
    info!("  GET /stats               - Cache statistics");
    info!("  GET /orders/{{order_uid}} - Order by id");
    if let Some(dir) = &config.static_dir {
        info!("  GET /*                   - Static files from {}", dir.display());
    }

    // Run HTTP server with graceful shutdown
    axum::serve(tcp, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    // Let in-flight messages finish
    let _ = listener_handle.await;

    info!("Order service stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then stop the listener.
async fn shutdown_signal(shutdown_tx: mpsc::Sender<()>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
    let _ = shutdown_tx.send(()).await;
}
