//! Axum HTTP server wiring.

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;
use crate::{completion, synthesis, token};

/// Start the relay server.
pub async fn start_server(state: Arc<AppState>, bind: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Relay listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the relay router. API routes are registered before the embedded
/// client so they take priority over the SPA catch-all.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/completion/stream", post(completion::completion_stream))
        .route("/synthesis", post(synthesis::synthesize))
        .route("/synthesis/warmup", get(synthesis::warmup))
        .route("/token", get(token::issue_token))
        .route("/health", get(health_handler))
        .with_state(state)
        .merge(voicerelay_web::client_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
