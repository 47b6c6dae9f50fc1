//! Voice-chat client — embedded static assets served by the gateway.
//!
//! Uses `rust-embed` to bake the `static/` directory into the binary.
//! In debug mode (`debug-embed` feature), files are read from disk so
//! the page can be edited and refreshed without rebuilding.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "static/"]
struct ClientAssets;

/// Build an axum `Router` that serves the embedded client.
///
/// Register this **after** the API routes so those take priority over
/// the catch-all.
pub fn client_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/{*path}", get(static_handler))
}

async fn index_handler() -> impl IntoResponse {
    serve_file("index.html")
}

async fn static_handler(Path(path): Path<String>) -> impl IntoResponse {
    serve_file(&path)
}

fn serve_file(path: &str) -> Response {
    match ClientAssets::get(path) {
        Some(asset) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                asset.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, Html("<h1>404</h1>")).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_asset_embedded() {
        assert!(ClientAssets::get("index.html").is_some());
        assert!(ClientAssets::get("app.js").is_some());
    }
}
