use crate::AppState;
use crate::api::error::AppError;
use crate::services::auth::{ClientCredentials, TokenCredentials};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const CLIENT_SECRET_HEADER: &str = "x-client-secret";

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// First gate: the calling application must be a known client.
pub async fn verify_client_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = ClientCredentials {
        client_id: header(req.headers(), CLIENT_ID_HEADER),
        client_secret: header(req.headers(), CLIENT_SECRET_HEADER),
    };

    let result = state.auth.verify_client(&credentials).await?;
    if result.is_success() {
        return Ok(next.run(req).await);
    }

    tracing::warn!(
        "Client verification rejected for client_id={}",
        credentials.client_id.as_deref().unwrap_or("<none>")
    );
    Err(AppError::AuthRejected(result.into_value()))
}

/// Second gate: the `authorization` header must hold a token the auth
/// service accepts. The header value is forwarded untouched.
pub async fn verify_token_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = TokenCredentials {
        access_token: header(req.headers(), axum::http::header::AUTHORIZATION.as_str()),
    };

    let result = state.auth.verify_token(&credentials).await?;
    if result.is_success() {
        return Ok(next.run(req).await);
    }

    tracing::warn!("Token verification rejected");
    Err(AppError::AuthRejected(result.into_value()))
}
