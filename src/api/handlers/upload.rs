use crate::AppState;
use crate::api::error::AppError;
use crate::services::staging::{StagedFile, StagingError, stage_upload};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

use super::types::*;

const FILE_FIELD: &str = "file";

fn multipart_error(e: MultipartError, max_file_size: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Staging(StagingError::TooLarge(max_file_size))
    } else {
        AppError::Staging(StagingError::Multipart(e.body_text()))
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    params(
        ("authorization" = String, Header, description = "Access token"),
        ("x-client-id" = String, Header, description = "Client id"),
        ("x-client-secret" = String, Header, description = "Client secret")
    ),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file field or malformed body", body = ErrorResponse),
        (status = 401, description = "Rejected by the auth service (its envelope is returned as-is)"),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "Object store or auth service failure", body = ErrorResponse),
        (status = 504, description = "Object store or auth service timed out", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    // Not a multipart body at all (wrong content type, bad boundary)
    let mut multipart =
        multipart.map_err(|e| AppError::Staging(StagingError::Multipart(e.body_text())))?;
    let max_file_size = state.config.max_file_size;

    let result: Result<Json<UploadResponse>, AppError> = async {
        let mut staged: Option<StagedFile> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_file_size))?
        {
            // Only the first file field counts; anything else is skipped
            if field.name() != Some(FILE_FIELD) || staged.is_some() {
                continue;
            }

            let original_filename = field.file_name().unwrap_or("unnamed").to_string();
            let content_type = field.content_type().map(|s| s.to_string());

            staged = Some(
                stage_upload(
                    &state.config.staging_dir,
                    &original_filename,
                    content_type.as_deref(),
                    Box::pin(field),
                    max_file_size,
                )
                .await?,
            );
        }

        let staged = staged.ok_or(AppError::BadRequest("No file provided".to_string()))?;
        let stored = state.relay.store(staged).await?;

        Ok(Json(stored.into()))
    }
    .await;

    match result {
        Ok(res) => Ok(res),
        Err(e) => {
            // Read out the rest of the body so the client sees our response instead of a reset
            tracing::warn!("Upload failed: {}. Draining remaining body...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
