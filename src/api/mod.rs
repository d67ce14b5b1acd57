//! REST API over the core services.
//!
//! Every business route lives under `/api` and needs the caller identity
//! header (see [`auth`]). `/health` is open.

/// Caller identity extraction
pub mod auth;
/// Budget routes
pub mod budgets;
/// HTTP mapping of [`crate::errors::Error`]
pub mod error;
/// Expense routes
pub mod expenses;
/// Forecast route
pub mod forecast;

use crate::{config::AppConfig, errors::Result};
use axum::{
    Json, Router,
    routing::{delete, get},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server-side store
    pub db: DatabaseConnection,
    /// Loaded application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Bundles the store and configuration for the handlers.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route("/expenses/totals", get(expenses::totals))
        .route("/expenses/{id}", delete(expenses::remove))
        .route(
            "/budgets",
            get(budgets::list)
                .post(budgets::upsert)
                .delete(budgets::remove),
        )
        .route("/budgets/status", get(budgets::status))
        .route("/forecast", get(forecast::current));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Binds the configured address and serves until Ctrl+C.
pub async fn serve(config: AppConfig, db: DatabaseConnection) -> Result<()> {
    let listener = TcpListener::bind(&config.server.bind_address).await?;
    info!(address = %listener.local_addr()?, "Expense API listening");

    let app = router(AppState::new(db, config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Expense API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
