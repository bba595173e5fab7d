use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod registry;
mod scan;

use crate::config::Config;
use crate::db::{PgProductStore, ProductStore};
use crate::registry::ConnectionRegistry;

/// Shared application state — cheap to clone (all heap behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub registry: Arc<ConnectionRegistry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,inventory_stock_service=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("Starting up the inventory stock service...");

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete.");

    let state = AppState {
        store: Arc::new(PgProductStore::new(pool.clone())),
        registry: Arc::new(ConnectionRegistry::new()),
    };

    let registry = state.registry.clone();
    let scan = scan::spawn(
        state.store.clone(),
        config.low_stock_threshold,
        config.low_stock_interval,
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);
    info!("Stock updates stream on ws://{}/ws/stock", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutting down the inventory stock service...");
    if !registry.is_empty().await {
        info!(live = registry.len().await, "WebSocket clients still connected at shutdown");
    }
    scan.abort();
    pool.close().await;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── Products ────────────────────────────────────────────────────────
        .route("/products", post(handlers::products::create_product))
        .route("/products/", post(handlers::products::create_product))
        .route(
            "/products/:id",
            get(handlers::products::get_product).put(handlers::products::update_stock),
        )

        // ── Stock updates stream ────────────────────────────────────────────
        .route("/ws/stock", get(handlers::ws::stock_updates))

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
