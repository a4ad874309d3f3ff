use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::errors::{ApiError, AuthError, SessionError};

/// Maps booking failures onto HTTP responses with a JSON `error` body.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ApiError::Network(_) => StatusCode::BAD_GATEWAY,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::InsufficientRole) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Server { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError(ApiError::Auth(err))
    }
}

// Session file trouble is ours, not the backend's
impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError(ApiError::Server {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: err.to_string(),
        })
    }
}
