//! HTTP surface
//!
//! Builds the axum router and runs the serve loop. Every gated handler runs
//! the permission guard before touching the request body or the database.

pub mod auth;
pub mod authors;
pub mod books;
pub mod security;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult, ConfigError};
use crate::store::Store;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn pepper(&self) -> Option<&str> {
        self.config.auth.pepper()
    }
}

/// Build the application router with security headers and request tracing
pub fn router(state: AppState) -> Result<Router, ConfigError> {
    let security = state.config.security.clone();

    let app = Router::new()
        .route("/health", get(health))
        .route("/api-token-auth/", post(auth::obtain_token))
        .route("/books/", get(books::list).post(books::create))
        .route(
            "/books/{id}/",
            get(books::retrieve)
                .put(books::update)
                .patch(books::partial_update)
                .delete(books::destroy),
        )
        .route("/authors/", get(authors::list).post(authors::create))
        .route("/authors/{id}/", get(authors::retrieve))
        .fallback(not_found)
        .with_state(state);

    let app = security::apply(app, &security)?;
    Ok(app.layer(TraceLayer::new_for_http()))
}

/// Migrate the database and serve until Ctrl+C
pub async fn run(config: AppConfig) -> crate::Result<()> {
    let store = Store::connect(&config.database).await?;
    store.migrate().await?;

    let bind_addr = config.server.bind_address();
    let app = router(AppState::new(store, config))?;

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Bookshelf API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> ApiError {
    ApiError::not_found("route")
}

/// Parse a path id; anything that is not an integer cannot name a row
pub(crate) fn parse_id(raw: &str, resource: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::not_found(format!("{resource} {raw}")))
}
