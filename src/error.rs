// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::models::DraftError;
use crate::database::RepoError;

/// Every failure a request can end in, mapped onto a fixed status and envelope
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest,

    // 401 / 403, status carried by the reason
    Authorization(AuthError),

    // 404 Not Found
    NotFound,

    // 405 Method Not Allowed
    MethodNotAllowed,

    // 422 Unprocessable Entity
    Unprocessable,

    // 500 Internal Server Error
    InternalServerError,

    // 503 Service Unavailable
    ServiceUnavailable,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::Authorization(reason) => reason.status(),
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest => "bad request".to_string(),
            ApiError::Authorization(reason) => reason.to_string(),
            ApiError::NotFound => "resource not found".to_string(),
            ApiError::MethodNotAllowed => "method not allowed".to_string(),
            ApiError::Unprocessable => "unprocessable".to_string(),
            ApiError::InternalServerError => "internal server error".to_string(),
            ApiError::ServiceUnavailable => "database unavailable".to_string(),
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.status_code().as_u16(),
            "message": self.message(),
        });

        if let ApiError::Authorization(reason) = self {
            body["code"] = json!(reason.code());
        }

        body
    }

    /// Storage failures while writing are reported as unprocessable, except
    /// for a vanished row.
    pub fn from_write(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(_) => ApiError::NotFound,
            other => {
                tracing::warn!("Drink write rejected: {}", other);
                ApiError::Unprocessable
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Authorization(err)
    }
}

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        tracing::debug!("Rejected drink payload: {}", err);
        match err {
            DraftError::MissingField(_) => ApiError::BadRequest,
            DraftError::InvalidField { .. } => ApiError::Unprocessable,
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(_) => ApiError::NotFound,
            other => {
                // Log the real error but return generic message
                tracing::error!("Storage fault: {}", other);
                ApiError::InternalServerError
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
