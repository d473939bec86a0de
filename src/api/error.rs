use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::crawler::controller::SubmitError;
use crate::services::SlackError;
use crate::storage::StorageError;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Upstream(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            SubmitError::ServiceUnavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotAuthenticated => ApiError::Unauthorized(err.to_string()),
            other => {
                error!("Google API call failed: {}", other);
                ApiError::Upstream(other.to_string())
            }
        }
    }
}

impl From<SlackError> for ApiError {
    fn from(err: SlackError) -> Self {
        error!("Slack call failed: {}", err);
        ApiError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(StorageError::NotAuthenticated).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(StorageError::Api { status: 500, body: "oops".into() }).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(SubmitError::ServiceUnavailable("browser".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
