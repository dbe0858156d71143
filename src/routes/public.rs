use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints for monitoring and for clients that want to mirror the server's view
/// of the route table.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Used by monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /routes
        // The flattened route table with effective metadata. Nested admin children
        // show the metadata inherited from their layout.
        .route("/routes", get(handlers::list_routes))
}
