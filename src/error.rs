use axum::{
    Json,
    http::{StatusCode, header::InvalidHeaderValue},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// CredentialDecodeFailure
///
/// The single recoverable failure of the gate: the stored credential cannot be turned
/// into a claim. The gate consumes it and answers with a redirect to login; it never
/// reaches an HTTP client as an error.
#[derive(Debug, Error)]
pub enum CredentialDecodeFailure {
    #[error("credential is not a valid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("credential carries no role claim")]
    MissingRole,
}

/// RouteTableError
///
/// Raised while building or loading a route table. Always fatal at startup.
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("route name '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("route path '{0}' is declared more than once")]
    DuplicatePath(String),

    #[error("invalid route path '{0}'")]
    InvalidPath(String),

    #[error("route table has no route named '{0}'")]
    MissingTarget(&'static str),

    #[error("login route '{0}' must not require authentication")]
    ProtectedLogin(String),

    #[error("failed to read route table: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse route table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// ConfigError
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY must be set in production")]
    MissingSecret,

    #[error("invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },
}

/// GateError
///
/// Errors raised at the call site around the gate (route resolution, response
/// assembly). The gate's own decisions are never errors.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("no route matches path '{0}'")]
    RouteNotFound(String),

    #[error("redirect location is not a valid header value: {0}")]
    InvalidLocation(#[from] InvalidHeaderValue),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            GateError::RouteNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GateError::InvalidLocation(e) => {
                tracing::error!("Invalid redirect location: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
