use crate::config::RelayConfig;
use anyhow::Context;
use tracing::info;

/// Make sure the staging directory exists before the first upload lands.
pub async fn setup_staging(config: &RelayConfig) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.staging_dir)
        .await
        .with_context(|| format!("cannot create staging dir {}", config.staging_dir.display()))?;

    info!("📂 Staging directory: {}", config.staging_dir.display());
    Ok(())
}
