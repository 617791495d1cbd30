use clap::Parser;
use dotenvy::dotenv;
use s3_file_relay::config::RelayConfig;
use s3_file_relay::infrastructure::{auth, staging, storage};
use s3_file_relay::services::relay_service::RelayService;
use s3_file_relay::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3_file_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting S3 File Relay...");

    let mut config = RelayConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    info!(
        "⚙️  Config: Base URL={}, Max Size={}MB, Storage Timeout={:?}",
        config.base_url,
        config.max_file_size / 1024 / 1024,
        config.storage_timeout
    );

    staging::setup_staging(&config).await?;
    let object_store = storage::setup_storage(&config).await;
    let auth_verifier = auth::setup_auth(&config)?;

    let state = AppState {
        relay: Arc::new(RelayService::new(object_store, config.clone())),
        auth: auth_verifier,
        config: config.clone(),
    };

    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ Server running on port {}", config.port);
    info!(
        "📖 Swagger UI documentation: http://localhost:{}/swagger-ui",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
