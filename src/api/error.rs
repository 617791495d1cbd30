use crate::services::auth::AuthError;
use crate::services::staging::StagingError;
use crate::services::storage::StorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// The auth service turned the caller down; carries its envelope as-is.
    #[error("Rejected by auth service")]
    AuthRejected(Value),

    #[error("Auth service error: {0}")]
    Auth(#[from] AuthError),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthRejected(envelope) => {
                return (StatusCode::UNAUTHORIZED, Json(envelope)).into_response();
            }
            AppError::Auth(e) => {
                tracing::error!("Auth service error: {}", e);
                let status = match e {
                    AuthError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, "Authorization service unavailable".to_string())
            }
            AppError::Staging(StagingError::TooLarge(limit)) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File exceeds the {} byte limit", limit),
            ),
            AppError::Staging(StagingError::Multipart(msg)) => {
                tracing::warn!("Malformed upload body: {}", msg);
                (StatusCode::BAD_REQUEST, "Malformed upload body".to_string())
            }
            AppError::Staging(StagingError::Io(e)) => {
                tracing::error!("Staging I/O error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                let status = match e {
                    StorageError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, "Failed to store file".to_string())
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": message
        }));

        (status, body).into_response()
    }
}
