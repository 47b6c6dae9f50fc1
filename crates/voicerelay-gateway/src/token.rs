//! Ephemeral speech-token proxy.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// GET /token — forward a token request to the identity provider and
/// hand the short-lived token to the browser client.
pub async fn issue_token(State(state): State<Arc<AppState>>) -> Response {
    let Some(issuer) = &state.tokens else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Speech key or region not set" })),
        )
            .into_response();
    };

    match issuer.issue().await {
        Ok(token) => Json(json!({ "token": token, "region": issuer.region() })).into_response(),
        Err(e) => {
            warn!(error = %e, "Token issuance failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
                .into_response()
        }
    }
}
