pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::RelayConfig;
use crate::services::auth::AuthVerifier;
use crate::services::relay_service::RelayService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Slack on top of `max_file_size` for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_file,
        api::handlers::retrieve::retrieve_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::UploadForm,
            api::handlers::UploadResponse,
            api::handlers::UploadData,
            api::handlers::ErrorResponse,
            api::handlers::RetrieveErrorResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "files", description = "Upload and retrieval"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService>,
    pub auth: Arc<dyn AuthVerifier>,
    pub config: RelayConfig,
}

pub fn create_app(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(&api::middleware::request_id::REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    // The last route layer runs first: client check, then token check
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::upload::upload_file)
                .layer(DefaultBodyLimit::max(
                    state.config.max_file_size.saturating_add(MULTIPART_OVERHEAD),
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::verify_token_middleware,
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::verify_client_middleware,
                )),
        )
        .route(
            "/:file_name",
            get(api::handlers::retrieve::retrieve_file),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(trace_layer)
        .layer(from_fn(
            api::middleware::request_id::request_id_middleware,
        ))
        .with_state(state)
}
