//! Upload Gate Server
//!
//! Serves the multipart upload protocol over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use upload_gate_server::config::{BackendKind, Config};
use upload_gate_server::db::{self, SqliteProgressStore};
use upload_gate_server::progress::{MemoryProgressStore, ProgressStore};
use upload_gate_server::routes;
use upload_gate_server::state::AppState;
use upload_gate_server::storage::{MemoryBackend, S3Backend, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upload_gate_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting Upload Gate Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Chunk size: {} bytes", config.upload.chunk_size);

    let (backend, progress): (Arc<dyn StorageBackend>, Arc<dyn ProgressStore>) =
        match config.storage.backend {
            BackendKind::S3 => {
                tracing::info!("Storage provider: {:?}", config.storage.provider);
                tracing::info!("S3 endpoint: {}", config.storage.endpoint);
                tracing::info!("S3 bucket: {}", config.storage.bucket);

                let backend = S3Backend::new(&config.storage)
                    .await
                    .context("Failed to initialize S3 client")?;

                let pool = db::create_pool(&config.database.url)
                    .await
                    .context("Failed to initialize database")?;
                tracing::info!("Database initialized at {}", config.database.url);

                (Arc::new(backend), Arc::new(SqliteProgressStore::new(pool)))
            }
            BackendKind::Memory => {
                tracing::warn!("Using in-memory storage; uploads are lost on restart");
                (Arc::new(MemoryBackend::new()), Arc::new(MemoryProgressStore::new()))
            }
        };

    let host = config.server.host.clone();
    let port = config.server.port;
    let app = routes::router(AppState::new(config, backend, progress));

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
    tracing::info!("Upload Gate Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
