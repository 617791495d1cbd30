use crate::services::relay_service::StoredUpload;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadData {
    pub filename: String,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    /// Always "success"
    pub status: String,
    pub data: UploadData,
}

impl From<StoredUpload> for UploadResponse {
    fn from(stored: StoredUpload) -> Self {
        Self {
            status: "success".to_string(),
            data: UploadData {
                filename: stored.filename,
                url: stored.url,
            },
        }
    }
}

/// Body of every failed upload.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always "error"
    pub status: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct RetrieveErrorResponse {
    pub success: bool,
    pub err: String,
}

/// Multipart form accepted by `POST /upload`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
