//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use spamcheck_core::ValidationError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The `text` field failed validation
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The body is not usable JSON
    #[error("{0}")]
    InvalidBody(String),

    #[error("model not loaded")]
    Unavailable,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("history unavailable: {0}")]
    History(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<spamcheck_core::Error> for AppError {
    fn from(err: spamcheck_core::Error) -> Self {
        match err {
            spamcheck_core::Error::Validation(v) => AppError::Validation(v),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::History(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::Validation(e) => json!({ "text": [e.to_string()] }),
            AppError::InvalidBody(msg) => json!({ "text": [msg] }),
            AppError::Unavailable => {
                json!({ "error": "ML model is not loaded. Please try again later." })
            }
            AppError::RateLimited => {
                json!({ "error": "Rate limit exceeded. Please try again later." })
            }
            AppError::History(msg) => {
                error!("Error retrieving classification history: {}", msg);
                metrics::counter!("spamcheck_errors_total", "kind" => "history").increment(1);
                json!({ "error": "Unable to retrieve history" })
            }
            AppError::Internal(msg) => {
                error!("Error in spam classification: {}", msg);
                metrics::counter!("spamcheck_errors_total", "kind" => "internal").increment(1);
                json!({ "error": "Internal server error" })
            }
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation(ValidationError::Blank).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_core_errors_map_to_internal() {
        let err: AppError = spamcheck_core::Error::internal("inference panicked").into();
        assert!(matches!(err, AppError::Internal(_)));

        let err: AppError = spamcheck_core::Error::Validation(ValidationError::Missing).into();
        assert!(matches!(err, AppError::Validation(ValidationError::Missing)));
    }
}
