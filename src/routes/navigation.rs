use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Navigation Router Module
///
/// Exposes the route authorization gate over HTTP.
pub fn navigation_routes() -> Router<AppState> {
    Router::new()
        // POST /navigate
        // JSON in, JSON out: the decision, the final location, and whether the
        // client must purge its stored token.
        .route("/navigate", post(handlers::navigate))
        // GET /guard?path=...
        // Status-code rendition for servers and proxies: 204 allow, 307 redirect.
        .route("/guard", get(handlers::guard))
}
