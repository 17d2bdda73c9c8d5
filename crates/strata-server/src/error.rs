//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use strata_auth::{AuthError, ErrorCategory, StoreError};

/// Errors surfaced by route handlers.
///
/// Guard outcomes (unauthenticated, denied, missing target) are not errors;
/// they become redirects. Anything reaching this type aborts the request and
/// its transaction is dropped without commit.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Auth(AuthError::from(err))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Auth(AuthError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => match err.category() {
                ErrorCategory::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCategory::Validation => StatusCode::BAD_REQUEST,
                ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "invalid",
            Self::Auth(AuthError::NotFound { .. }) => "not-found",
            Self::Auth(AuthError::InvalidRequest { .. }) => "invalid",
            Self::Auth(AuthError::Storage(_)) => "storage",
            Self::Auth(_) => "exception",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        // Store details stay in the log.
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": self.code(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}
