use crate::{
    AppState,
    error::GateError,
    models::{NavigateRequest, NavigationResponse, ResolvedRoute},
    navigator,
};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

/// Header telling the browser to drop stored site data, which is where the client
/// keeps its access token.
static CLEAR_SITE_DATA: HeaderName = HeaderName::from_static("clear-site-data");

// --- Query Structs ---

/// GuardQuery
///
/// Query parameters for `GET /guard`.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GuardQuery {
    /// The client-side path about to be navigated to.
    pub path: String,
}

// --- Handlers ---

/// list_routes
///
/// [Public Route] Lists the flattened route table with each route's effective
/// access-control metadata.
#[utoipa::path(
    get,
    path = "/routes",
    responses((status = 200, description = "Route table", body = [ResolvedRoute]))
)]
pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<ResolvedRoute>> {
    Json(state.table.routes().to_vec())
}

/// navigate
///
/// [Public Route] Evaluates a navigation attempt with an explicitly supplied
/// credential. The response says where the client ends up and whether it must
/// purge its stored token.
#[utoipa::path(
    post,
    path = "/navigate",
    request_body = NavigateRequest,
    responses(
        (status = 200, description = "Gate decision", body = NavigationResponse),
        (status = 404, description = "No route matches the path", body = crate::error::ErrorResponse)
    )
)]
pub async fn navigate(
    State(state): State<AppState>,
    Json(payload): Json<NavigateRequest>,
) -> Result<Json<NavigationResponse>, GateError> {
    let navigation = navigator::evaluate(
        &state.table,
        &state.decoder,
        &payload.path,
        payload.token.as_deref(),
    )?;

    Ok(Json(navigation.into()))
}

/// guard
///
/// [Public Route] HTTP rendition of the gate for servers fronting the client. The
/// credential is read from `Authorization: Bearer`. A header without a non-empty
/// Bearer token counts as no credential.
///
/// Answers `204` on allow and `307` with `Location` on redirect. A purging redirect
/// also carries `Clear-Site-Data: "storage"`.
#[utoipa::path(
    get,
    path = "/guard",
    params(GuardQuery),
    responses(
        (status = 204, description = "Navigation allowed"),
        (status = 307, description = "Redirect to the Location header"),
        (status = 404, description = "No route matches the path", body = crate::error::ErrorResponse)
    )
)]
pub async fn guard(
    State(state): State<AppState>,
    Query(query): Query<GuardQuery>,
    headers: HeaderMap,
) -> Result<Response, GateError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let navigation = navigator::evaluate(&state.table, &state.decoder, &query.path, token)?;

    if navigation.decision.is_allowed() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::LOCATION, HeaderValue::from_str(&navigation.location)?);
    if navigation.decision.purges_credential() {
        response_headers.insert(
            CLEAR_SITE_DATA.clone(),
            HeaderValue::from_static("\"storage\""),
        );
    }

    Ok((StatusCode::TEMPORARY_REDIRECT, response_headers).into_response())
}
