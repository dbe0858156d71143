use axum::{Router, http::HeaderName};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core gate components.
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod models;
pub mod navigator;
pub mod route_table;
pub mod store;

// HTTP surface.
pub mod handlers;
pub mod routes;
use routes::{navigation, public};

// --- Public Re-exports ---

pub use auth::{ClaimShape, DecodedClaim, TokenDecoder};
pub use config::AppConfig;
pub use error::{ConfigError, CredentialDecodeFailure, GateError, RouteTableError};
pub use gate::authorize;
pub use models::{Decision, RedirectReason, RedirectTarget, Role, RouteMeta};
pub use navigator::{Navigation, Navigator};
pub use route_table::RouteTable;
pub use store::{ACCESS_TOKEN_KEY, CredentialStore, MemoryCredentialStore, StoreState};

/// ApiDoc
///
/// OpenAPI document for the decision service, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::list_routes, handlers::navigate, handlers::guard),
    components(
        schemas(
            models::Role, models::RouteMeta, models::ResolvedRoute, models::RedirectTarget,
            models::RedirectReason, models::Decision, models::NavigateRequest,
            models::NavigationResponse, error::ErrorResponse,
        )
    ),
    tags(
        (name = "quiz-gate", description = "Quiz Master route authorization gate")
    )
)]
struct ApiDoc;

/// AppState
///
/// Immutable state shared by every request: the route table, the configured
/// decoder, and the configuration they were built from.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub decoder: Arc<TokenDecoder>,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the route table (from `routes_file` when set, otherwise the built-in
    /// Quiz Master table) and the decoder described by `config`.
    pub fn from_config(config: AppConfig) -> Result<Self, RouteTableError> {
        let table = match &config.routes_file {
            Some(path) => RouteTable::from_json_file(path)?,
            None => RouteTable::quiz_master()?,
        };

        Ok(Self {
            table: Arc::new(table),
            decoder: Arc::new(TokenDecoder::from_config(&config)),
            config,
        })
    }
}

/// create_router
///
/// Assembles the routing structure, applies the observability layers, and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(navigation::navigation_routes())
        .with_state(state);

    // Request ids are generated first so the trace span and the response both see them.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`, correlating every log line of a request by its
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
