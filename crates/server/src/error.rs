use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fraudlens::{PipelineError, ValidationErrors};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid query parameters")]
    Validation(ValidationErrors),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Not found")]
    NotFound,

    /// Anything the caller cannot fix. The message is logged, never
    /// returned.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Validation(_) => "validation_error",
            ServerError::Authentication(_) => "unauthorized",
            ServerError::RateLimitExceeded => "rate_limit_exceeded",
            ServerError::NotFound => "not_found",
            ServerError::Internal(_) => "internal_error",
        }
    }

    fn body(&self) -> ErrorResponse {
        let message = match self {
            ServerError::Internal(_) => "An unexpected error occurred".to_string(),
            ServerError::RateLimitExceeded => "Too many requests, retry later".to_string(),
            other => other.to_string(),
        };
        let details = match self {
            ServerError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };
        ErrorResponse {
            error: self.error_code().to_string(),
            message,
            details,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let ServerError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(errors) => ServerError::Validation(errors),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_body_carries_details() {
        let mut errors = ValidationErrors::new();
        errors.add("q", "Required");
        let err = ServerError::from(PipelineError::Validation(errors));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "error": "validation_error",
                "message": "Invalid query parameters",
                "details": {"q": ["Required"]},
            })
        );
    }

    #[test]
    fn internal_message_is_generic() {
        let err = ServerError::from(PipelineError::Store(store::StoreError::backend(
            "password authentication failed",
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body.error, "internal_error");
        assert_eq!(body.message, "An unexpected error occurred");
        assert!(body.details.is_none());
    }

    #[test]
    fn rate_limit_code() {
        assert_eq!(
            ServerError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ServerError::RateLimitExceeded.error_code(), "rate_limit_exceeded");
    }
}
