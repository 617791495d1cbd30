use crate::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use super::types::RetrieveErrorResponse;

#[utoipa::path(
    get,
    path = "/{file_name}",
    params(
        ("file_name" = String, Path, description = "Storage key returned by the upload")
    ),
    responses(
        (status = 200, description = "Raw file bytes"),
        (status = 400, description = "Object could not be fetched", body = RetrieveErrorResponse)
    ),
    tag = "files"
)]
pub async fn retrieve_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Response {
    let object = match state.relay.fetch(&file_name).await {
        Ok(object) => object,
        Err(e) => {
            tracing::warn!("Failed to retrieve {}: {}", file_name, e);
            return (
                StatusCode::BAD_REQUEST,
                Json(RetrieveErrorResponse {
                    success: false,
                    err: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let stream = ReaderStream::new(object.body.into_async_read());
    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();

    if let Some(content_type) = object
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        headers.insert(header::CONTENT_TYPE, content_type);
    }

    if let Some(length) = object.content_length.and_then(|l| u64::try_from(l).ok()) {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    response
}
