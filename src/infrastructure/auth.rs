use crate::config::RelayConfig;
use crate::services::auth::HttpAuthVerifier;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub fn setup_auth(config: &RelayConfig) -> anyhow::Result<Arc<HttpAuthVerifier>> {
    let verifier = HttpAuthVerifier::new(config.auth_service_url.clone(), config.auth_timeout)
        .context("failed to build auth service client")?;

    info!(
        "🔐 Auth service: {} (timeout {:?})",
        config.auth_service_url, config.auth_timeout
    );
    Ok(Arc::new(verifier))
}
