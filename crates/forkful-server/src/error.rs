use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use forkful_shared::ValidationError;
use forkful_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    /// The request body was cut off before the image was fully read.
    #[error("Upload exceeds the {max} byte image limit")]
    UploadTooLarge { max: usize },

    #[error("Unsupported image format (expected jpeg, png or webp)")]
    UnsupportedImage,

    #[error("Image storage error: {0}")]
    ImageStorage(String),

    #[error("Places search is not configured")]
    PlacesDisabled,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("Record not found".into()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::Validation(e) => {
                let body = serde_json::json!({
                    "error": e.to_string(),
                    "field": e.field(),
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response();
            }
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::ImageTooLarge { .. } | ServerError::UploadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::UnsupportedImage => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, self.to_string())
            }
            ServerError::ImageStorage(_) => {
                tracing::error!(error = %self, "image storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Image storage error".to_string())
            }
            ServerError::PlacesDisabled => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ServerError::Upstream(_) => {
                tracing::warn!(error = %self, "upstream request failed");
                (StatusCode::BAD_GATEWAY, "Upstream service error".to_string())
            }
            ServerError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
