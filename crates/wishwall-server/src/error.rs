use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use wishwall_shared::WishError;
use wishwall_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Invalid(#[from] WishError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Unsupported image format")]
    UnsupportedImage,

    #[error("Image storage error: {0}")]
    Storage(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("record".to_string()),
            StoreError::Invalid(inner) => ServerError::Invalid(inner),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Invalid(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::ImageTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::UnsupportedImage => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, self.to_string())
            }
            ServerError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Image storage error".to_string())
            }
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
